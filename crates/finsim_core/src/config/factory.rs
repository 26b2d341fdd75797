//! Profile factory - type name to constructor table
//!
//! The factory is an explicit value built by the caller, not global state.
//! [`ProfileFactory::standard`] registers the built-in kinds; callers can add
//! or override constructors with [`ProfileFactory::register`].

use jiff::civil::Date;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::ProfileTemplate;
use crate::accrual::{AccrualModel, Period};
use crate::error::ConfigError;
use crate::model::{
    AmortizingLoan, Cash, ConstantExpense, ConstantGrowthAsset, ConstantSalariedIncome,
    EventGroup, EventProfile, TaxBracket, TaxPayment,
};

/// Builds a profile from its template. The accrual model argument is the
/// scenario default, used when the payload does not name one.
pub type ProfileConstructor = fn(&ProfileTemplate, AccrualModel) -> Result<EventProfile, ConfigError>;

#[derive(Debug, Clone, Default)]
pub struct ProfileFactory {
    constructors: FxHashMap<String, ProfileConstructor>,
}

impl ProfileFactory {
    /// An empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// The six built-in kinds
    pub fn standard() -> Self {
        let mut factory = Self::new();
        factory.register("cash", build_cash);
        factory.register("constant-growth-asset", build_growth_asset);
        factory.register("amortizing-loan", build_loan);
        factory.register("constant-salaried-income", build_salary);
        factory.register("constant-expense", build_expense);
        factory.register("tax-payment", build_tax_payment);
        factory
    }

    /// Register a constructor, returning the one it replaces
    pub fn register(
        &mut self,
        kind: impl Into<String>,
        constructor: ProfileConstructor,
    ) -> Option<ProfileConstructor> {
        self.constructors.insert(kind.into(), constructor)
    }

    pub fn is_registered(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    pub fn create(
        &self,
        template: &ProfileTemplate,
        default_model: AccrualModel,
    ) -> Result<EventProfile, ConfigError> {
        let constructor = self
            .constructors
            .get(&template.kind)
            .ok_or_else(|| ConfigError::UnknownEventType(template.kind.clone()))?;
        constructor(template, default_model)
    }

    /// Instantiate `templates` in order as a snapshot dated `date`
    pub fn create_group(
        &self,
        date: Date,
        templates: &[ProfileTemplate],
        default_model: AccrualModel,
    ) -> Result<EventGroup, ConfigError> {
        let mut group = EventGroup::new(date);
        for template in templates {
            group.push(self.create(template, default_model)?)?;
        }
        Ok(group)
    }
}

fn decode<T: DeserializeOwned>(template: &ProfileTemplate) -> Result<T, ConfigError> {
    T::deserialize(&template.data).map_err(|e| ConfigError::InvalidProfileData {
        name: template.name.clone(),
        kind: template.kind.clone(),
        message: e.to_string(),
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CashData {
    value: f64,
}

fn build_cash(template: &ProfileTemplate, _: AccrualModel) -> Result<EventProfile, ConfigError> {
    let data: CashData = decode(template)?;
    Ok(EventProfile::Cash(Cash::new(&template.name, data.value)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GrowthAssetData {
    initial_value: f64,
    annual_appreciation: f64,
    accrual_model: Option<AccrualModel>,
}

fn build_growth_asset(
    template: &ProfileTemplate,
    default_model: AccrualModel,
) -> Result<EventProfile, ConfigError> {
    let data: GrowthAssetData = decode(template)?;
    Ok(EventProfile::ConstantGrowthAsset(ConstantGrowthAsset::new(
        &template.name,
        data.initial_value,
        data.annual_appreciation,
        data.accrual_model.unwrap_or(default_model),
    )))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoanData {
    #[serde(default)]
    initial_principle: f64,
    loan_amount: f64,
    rate: f64,
    remaining_term_in_years: f64,
    /// Negative or absent: computed on the first payment
    payment: Option<f64>,
    accrual_model: Option<AccrualModel>,
}

fn build_loan(
    template: &ProfileTemplate,
    default_model: AccrualModel,
) -> Result<EventProfile, ConfigError> {
    let data: LoanData = decode(template)?;
    let loan = AmortizingLoan::new(
        &template.name,
        data.accrual_model.unwrap_or(default_model),
        data.loan_amount,
        data.rate,
        data.remaining_term_in_years,
    )
    .with_principal(data.initial_principle)
    .with_payment(data.payment.unwrap_or(-1.0));
    Ok(EventProfile::AmortizingLoan(loan))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SalaryData {
    salary: f64,
    accrual_model: Option<AccrualModel>,
}

fn build_salary(
    template: &ProfileTemplate,
    default_model: AccrualModel,
) -> Result<EventProfile, ConfigError> {
    let data: SalaryData = decode(template)?;
    Ok(EventProfile::ConstantSalariedIncome(
        ConstantSalariedIncome::new(
            &template.name,
            data.salary,
            data.accrual_model.unwrap_or(default_model),
        ),
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExpenseData {
    yearly_expense: f64,
    accrual_model: Option<AccrualModel>,
}

fn build_expense(
    template: &ProfileTemplate,
    default_model: AccrualModel,
) -> Result<EventProfile, ConfigError> {
    let data: ExpenseData = decode(template)?;
    Ok(EventProfile::ConstantExpense(ConstantExpense::new(
        &template.name,
        data.yearly_expense,
        data.accrual_model.unwrap_or(default_model),
    )))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaxPaymentData {
    frequency: Period,
    accrual_model: Option<AccrualModel>,
    brackets: Vec<TaxBracket>,
}

fn build_tax_payment(
    template: &ProfileTemplate,
    default_model: AccrualModel,
) -> Result<EventProfile, ConfigError> {
    let data: TaxPaymentData = decode(template)?;
    let tax = TaxPayment::new(
        &template.name,
        data.frequency,
        data.accrual_model.unwrap_or(default_model),
        data.brackets,
    )?;
    Ok(EventProfile::TaxPayment(tax))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MONTHLY: AccrualModel = AccrualModel::PeriodicMonthly;

    fn create(kind: &str, data: serde_json::Value) -> Result<EventProfile, ConfigError> {
        ProfileFactory::standard().create(&ProfileTemplate::new(kind, "test", data), MONTHLY)
    }

    #[test]
    fn test_standard_kinds_are_registered() {
        let factory = ProfileFactory::standard();
        for kind in [
            "cash",
            "constant-growth-asset",
            "amortizing-loan",
            "constant-salaried-income",
            "constant-expense",
            "tax-payment",
        ] {
            assert!(factory.is_registered(kind), "{kind} missing");
        }
    }

    #[test]
    fn test_build_cash() {
        let profile = create("cash", json!({ "value": 100 })).unwrap();
        assert_eq!(profile.as_cash().unwrap().value, 100.0);
        assert_eq!(profile.name(), "test");
        assert_eq!(profile.kind(), "cash");
    }

    #[test]
    fn test_build_growth_asset_uses_default_model() {
        let profile = create(
            "constant-growth-asset",
            json!({ "initialValue": 500, "annualAppreciation": 0.05 }),
        )
        .unwrap();
        let asset = profile.as_growth_asset().unwrap();
        assert_eq!(asset.value, 500.0);
        assert_eq!(asset.accrual_model, MONTHLY);

        let profile = create(
            "constant-growth-asset",
            json!({ "initialValue": 500, "annualAppreciation": 0.05, "accrualModel": "pro rata" }),
        )
        .unwrap();
        assert_eq!(
            profile.as_growth_asset().unwrap().accrual_model,
            AccrualModel::ProRata
        );
    }

    #[test]
    fn test_build_loan_payment_sentinel() {
        let data = json!({
            "initialPrinciple": 0,
            "loanAmount": 200000,
            "rate": 0.04,
            "remainingTermInYears": 30,
            "payment": -1,
            "accrualModel": "periodic monthly"
        });
        let profile = create("amortizing-loan", data).unwrap();
        let loan = profile.as_loan().unwrap();
        assert_eq!(loan.payment, None);
        assert_eq!(loan.loan_amount, 200_000.0);
        assert_eq!(loan.remaining_term, 30.0);

        let data = json!({
            "loanAmount": 200000,
            "rate": 0.04,
            "remainingTermInYears": 30,
            "payment": 950.5
        });
        let profile = create("amortizing-loan", data).unwrap();
        assert_eq!(profile.as_loan().unwrap().payment, Some(950.5));
    }

    #[test]
    fn test_build_tax_payment() {
        let data = json!({
            "frequency": "1M",
            "accrualModel": "periodic monthly",
            "brackets": [
                { "rate": 0.05, "income": 0 },
                { "rate": 0.10, "income": 40000 }
            ]
        });
        let profile = create("tax-payment", data).unwrap();
        let tax = profile.as_tax_payment().unwrap();
        assert_eq!(tax.frequency, Period::months(1));
        assert_eq!(tax.brackets().len(), 2);
    }

    #[test]
    fn test_tax_payment_bracket_errors_surface() {
        let data = json!({ "frequency": "1M", "brackets": [] });
        assert!(matches!(
            create("tax-payment", data),
            Err(ConfigError::EmptyTaxSchedule)
        ));
        let data = json!({ "frequency": "1M", "brackets": [{ "rate": 0.05, "income": 10 }] });
        assert!(matches!(
            create("tax-payment", data),
            Err(ConfigError::NonZeroLowestBracket { .. })
        ));
    }

    #[test]
    fn test_unknown_type() {
        let err = create("lottery-ticket", json!({})).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownEventType(kind) if kind == "lottery-ticket"));
    }

    #[test]
    fn test_missing_field() {
        let err = create("constant-expense", json!({ "salary": 10 })).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidProfileData { .. }));
    }

    #[test]
    fn test_custom_constructor() {
        fn windfall(template: &ProfileTemplate, _: AccrualModel) -> Result<EventProfile, ConfigError> {
            Ok(EventProfile::Cash(Cash::new(&template.name, 1_000_000.0)))
        }
        let mut factory = ProfileFactory::new();
        assert!(factory.register("windfall", windfall).is_none());
        let profile = factory
            .create(&ProfileTemplate::new("windfall", "lucky", json!(null)), MONTHLY)
            .unwrap();
        assert_eq!(profile.as_cash().unwrap().value, 1_000_000.0);
        assert!(!factory.is_registered("cash"));
    }

    #[test]
    fn test_create_group_rejects_duplicates() {
        let templates = vec![
            ProfileTemplate::new("cash", "Savings", json!({ "value": 1 })),
            ProfileTemplate::new("cash", "Savings", json!({ "value": 2 })),
        ];
        let err = ProfileFactory::standard()
            .create_group(jiff::civil::date(2000, 1, 1), &templates, MONTHLY)
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateProfileName(_)));
    }
}
