mod group;
mod profiles;

pub use group::EventGroup;
pub use profiles::{
    AmortizingLoan, Cash, ConstantExpense, ConstantGrowthAsset, ConstantSalariedIncome,
    EventProfile, TaxBracket, TaxPayment,
};
