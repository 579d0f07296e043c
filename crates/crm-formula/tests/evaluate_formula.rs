//! Behaviour of the public formula entry points on CRM-shaped records

use crm_formula::{
    evaluate_formula, extract_field_references, validate_formula, EvaluationResult, FieldValue,
    FormulaValue, Record, ReturnType,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn record<const N: usize>(fields: [(&str, FieldValue); N]) -> Record {
    fields.into_iter().collect()
}

fn ok(value: FormulaValue, return_type: ReturnType) -> EvaluationResult {
    EvaluationResult {
        value: Some(value),
        error: None,
        return_type,
    }
}

#[test]
fn test_constant_expression() {
    assert_eq!(
        evaluate_formula("1 + 1", &Record::new(), ReturnType::Number),
        ok(FormulaValue::Number(2.0), ReturnType::Number)
    );
}

#[test]
fn test_gross_commission_in_currency() {
    let ctx = record([
        ("amount", 450000.0.into()),
        ("commissionPct", 3.0.into()),
    ]);
    assert_eq!(
        evaluate_formula("amount * commissionPct / 100", &ctx, ReturnType::Currency),
        ok(FormulaValue::Number(13500.0), ReturnType::Currency)
    );
}

#[test]
fn test_if_as_boolean() {
    let ctx = record([("amount", 50000.0.into())]);
    assert_eq!(
        evaluate_formula("IF(amount > 100000, 1, 0)", &ctx, ReturnType::Boolean),
        ok(FormulaValue::Boolean(false), ReturnType::Boolean)
    );
}

/// Zero balances fall back to the default: a business rule, not a null check.
#[test]
fn test_coalesce_treats_zero_as_missing() {
    let ctx = record([("balanceDue", 0.0.into())]);
    assert_eq!(
        evaluate_formula("COALESCE(balanceDue, 500)", &ctx, ReturnType::Currency),
        ok(FormulaValue::Number(500.0), ReturnType::Currency)
    );

    let ctx = record([("balanceDue", 125.5.into())]);
    assert_eq!(
        evaluate_formula("COALESCE(balanceDue, 500)", &ctx, ReturnType::Currency),
        ok(FormulaValue::Number(125.5), ReturnType::Currency)
    );
}

#[test]
fn test_missing_variable_defaults_to_zero() {
    assert_eq!(
        evaluate_formula("missingVar + 1", &Record::new(), ReturnType::Number),
        ok(FormulaValue::Number(1.0), ReturnType::Number)
    );
}

/// A present-but-non-numeric field is left unbound, unlike a missing one.
#[test]
fn test_non_numeric_field_is_an_evaluation_error() {
    let ctx = record([("nonNumericField", "abc".into())]);
    let result = evaluate_formula("nonNumericField + 1", &ctx, ReturnType::Number);
    assert_eq!(result.value, None);
    assert_eq!(result.return_type, ReturnType::Number);
    assert_eq!(
        result.error.as_deref(),
        Some("Undefined variable: nonNumericField")
    );
}

#[test]
fn test_object_field_is_an_evaluation_error() {
    let ctx = record([(
        "address",
        FieldValue::Unsupported(serde_json::json!({"city": "Austin"})),
    )]);
    let result = evaluate_formula("address * 2", &ctx, ReturnType::Number);
    assert!(result.error.is_some());
}

#[test]
fn test_non_numeric_field_is_ignored_when_unreferenced() {
    let ctx = record([("agentName", "Dana".into()), ("amount", 10.0.into())]);
    assert_eq!(
        evaluate_formula("amount * 2", &ctx, ReturnType::Number),
        ok(FormulaValue::Number(20.0), ReturnType::Number)
    );
}

#[test]
fn test_numeric_strings_are_parsed() {
    let ctx = record([("amount", "450000".into()), ("commissionPct", "2.5%".into())]);
    assert_eq!(
        evaluate_formula("amount * commissionPct / 100", &ctx, ReturnType::Currency),
        ok(FormulaValue::Number(11250.0), ReturnType::Currency)
    );
}

#[test]
fn test_null_and_boolean_fields() {
    let ctx = record([
        ("referralFee", FieldValue::Null),
        ("isDualAgency", true.into()),
        ("amount", 1000.0.into()),
    ]);
    assert_eq!(
        evaluate_formula("amount * (1 + isDualAgency) - referralFee", &ctx, ReturnType::Number),
        ok(FormulaValue::Number(2000.0), ReturnType::Number)
    );
}

#[test]
fn test_currency_rounding_follows_fixed_point() {
    // 1.005 is stored as 1.00499999..., so it rounds down
    assert_eq!(
        evaluate_formula("1.005", &Record::new(), ReturnType::Currency),
        ok(FormulaValue::Number(1.0), ReturnType::Currency)
    );
    // 10.005 is stored as 10.00500000000000078..., so it rounds up
    assert_eq!(
        evaluate_formula("10.005", &Record::new(), ReturnType::Currency),
        ok(FormulaValue::Number(10.01), ReturnType::Currency)
    );
    assert_eq!(
        evaluate_formula("10.125", &Record::new(), ReturnType::Currency),
        ok(FormulaValue::Number(10.13), ReturnType::Currency)
    );
    assert_eq!(
        evaluate_formula("1234.5678", &Record::new(), ReturnType::Currency),
        ok(FormulaValue::Number(1234.57), ReturnType::Currency)
    );
}

#[test]
fn test_number_is_not_rounded() {
    assert_eq!(
        evaluate_formula("10 / 3", &Record::new(), ReturnType::Number),
        ok(FormulaValue::Number(10.0 / 3.0), ReturnType::Number)
    );
}

#[test]
fn test_text_return_type() {
    let ctx = record([("amount", 13500.0.into())]);
    assert_eq!(
        evaluate_formula("amount", &ctx, ReturnType::Text),
        ok(FormulaValue::Text("13500".into()), ReturnType::Text)
    );
}

#[test]
fn test_date_return_type_passes_through() {
    let ctx = record([("closeDate", 45292.0.into())]);
    assert_eq!(
        evaluate_formula("closeDate + 30", &ctx, ReturnType::Date),
        ok(FormulaValue::Number(45322.0), ReturnType::Date)
    );
}

#[test]
fn test_ifgt_split() {
    let ctx = record([("gci", 120000.0.into()), ("cap", 0.0.into())]);
    assert_eq!(
        evaluate_formula("IFGT(gci, 100000, gci * 0.9, gci * 0.8)", &ctx, ReturnType::Currency),
        ok(FormulaValue::Number(108000.0), ReturnType::Currency)
    );
    assert_eq!(
        evaluate_formula("IFGT(cap, -1, 1, 2)", &ctx, ReturnType::Number),
        ok(FormulaValue::Number(1.0), ReturnType::Number)
    );
}

#[test]
fn test_builtin_spellings() {
    let ctx = record([("x", (-2.345).into())]);
    let cases = [
        ("Abs(x)", 2.345),
        ("Ceil(x)", -2.0),
        ("Floor(x)", -3.0),
        ("Round(x, 1)", -2.3),
        ("Max(x, 1, 4)", 4.0),
        ("Min(x, 1, 4)", -2.345),
        ("Sqrt(16)", 4.0),
        ("Len(\"abc\")", 3.0),
        ("If(x < 0, 1, 2)", 1.0),
    ];
    for (formula, expected) in cases {
        assert_eq!(
            evaluate_formula(formula, &ctx, ReturnType::Number),
            ok(FormulaValue::Number(expected), ReturnType::Number),
            "{}",
            formula
        );
    }
}

#[test]
fn test_parse_errors_are_reported_not_raised() {
    for formula in ["amount * (", "1 +", "", "a = 1", "Max(1,,2)"] {
        let result = evaluate_formula(formula, &Record::new(), ReturnType::Currency);
        assert_eq!(result.value, None, "{}", formula);
        assert!(result.error.unwrap().starts_with("Parse error"), "{}", formula);
    }
}

#[test]
fn test_long_formula_is_rejected_without_crashing() {
    let ctx = record([("amount", 1.0.into())]);
    let formula = vec!["amount"; 10_000].join(" + ");
    let result = evaluate_formula(&formula, &ctx, ReturnType::Number);
    assert_eq!(result.value, None);
    assert!(result.error.unwrap().starts_with("Parse error"));

    let formula = vec!["amount"; 400].join(" + ");
    assert_eq!(
        evaluate_formula(&formula, &ctx, ReturnType::Number),
        ok(FormulaValue::Number(400.0), ReturnType::Number)
    );
}

#[test]
fn test_deep_nesting_is_rejected_without_crashing() {
    let formula = format!("{}amount{}", "(".repeat(5_000), ")".repeat(5_000));
    let result = evaluate_formula(&formula, &Record::new(), ReturnType::Number);
    assert!(result.error.unwrap().starts_with("Parse error"));
}

#[test]
fn test_evaluation_errors_are_reported_not_raised() {
    let result = evaluate_formula("IF(1, 2)", &Record::new(), ReturnType::Number);
    assert!(result.error.unwrap().contains("Wrong number of arguments"));

    let result = evaluate_formula("SUM(1, 2)", &Record::new(), ReturnType::Number);
    assert_eq!(result.error.as_deref(), Some("Unknown function: SUM"));
}

#[test]
fn test_validate_formula() {
    let result = validate_formula("amount * (");
    assert!(!result.valid);
    assert!(!result.error.unwrap_or_default().is_empty());

    let result = validate_formula("amount * (commissionPct / 100)");
    assert!(result.valid);
    assert_eq!(result.error, None);
}

#[test]
fn test_extract_field_references() {
    let fields = extract_field_references("IF(amount > 100, fee, 0)");
    assert!(fields.contains(&"amount".to_string()));
    assert!(fields.contains(&"fee".to_string()));
    assert!(!fields.contains(&"IF".to_string()));
    assert!(!fields.contains(&"100".to_string()));
    assert!(!fields.contains(&"0".to_string()));
}

fn field_value() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        Just(FieldValue::Null),
        any::<bool>().prop_map(FieldValue::Bool),
        (-1.0e9..1.0e9f64).prop_map(FieldValue::Number),
    ]
}

fn formula() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "a + b * c",
        "a / b - c % 7",
        "IF(a > b, c, a) ^ 2",
        "IFGT(a, b, c, 0)",
        "COALESCE(a, b) + Round(c, 2)",
        "Max(a, b, c) - Min(a, b, c)",
        "Abs(a) + Ceil(b) + Floor(c) + Sqrt(Abs(a))",
        "!(a == b) && (c != 0 || a >= b)",
        "-a + +b - Len(c)",
    ])
    .prop_map(str::to_string)
}

proptest! {
    #[test]
    fn prop_numeric_contexts_never_error(
        formula in formula(),
        a in field_value(),
        b in field_value(),
        c in field_value(),
        omit_c in any::<bool>(),
        return_type in prop::sample::select(ReturnType::ALL.to_vec()),
    ) {
        let mut ctx = Record::new();
        ctx.insert("a", a);
        ctx.insert("b", b);
        if !omit_c {
            ctx.insert("c", c);
        }
        let result = evaluate_formula(&formula, &ctx, return_type);
        prop_assert_eq!(result.error, None);
        prop_assert_eq!(result.return_type, return_type);
    }

    #[test]
    fn prop_evaluation_is_idempotent(
        formula in formula(),
        a in field_value(),
        b in field_value(),
        c in field_value(),
    ) {
        let ctx: Record = [("a", a), ("b", b), ("c", c)].into_iter().collect();
        let first = evaluate_formula(&formula, &ctx, ReturnType::Currency);
        let second = evaluate_formula(&formula, &ctx, ReturnType::Currency);
        // Compare through JSON so NaN results still compare equal
        prop_assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
