use webdice_chart::parameters::{ParameterDescriptor, ParameterKind, ParameterSet, ParameterValue};

fn descriptors() -> Vec<ParameterDescriptor> {
    vec![
        ParameterDescriptor::range("Elasticity of marginal utility", "elasmu", 1.0, 4.0, 0.1, 2.0),
        ParameterDescriptor::options(
            "Damage function",
            "damages_model",
            &[("dice2007", "DICE 2007"), ("weitzman", "Weitzman")],
            "dice2007",
        ),
    ]
}

#[test]
fn test_quantize_clamps_and_snaps() {
    let d = &descriptors()[0];
    assert_eq!(d.quantize(2.04), 2.0);
    assert_eq!(d.quantize(2.36), 2.4);
    assert_eq!(d.quantize(9.0), 4.0);
    assert_eq!(d.quantize(-3.0), 1.0);
    assert_eq!(d.quantize(f64::NAN), 2.0);
}

#[test]
fn test_set_normalizes_values() {
    let descs = descriptors();
    let mut set = ParameterSet::defaults(&descs);
    assert_eq!(set.len(), 2);

    set.set(&descs, "elasmu", ParameterValue::Choice("3.33".into()));
    assert_eq!(set.get("elasmu"), Some(&ParameterValue::Number(3.3)));

    set.set(&descs, "damages_model", ParameterValue::Choice("unknown".into()));
    assert_eq!(set.get("damages_model"), Some(&ParameterValue::Choice("dice2007".into())));

    set.set(&descs, "free_form", ParameterValue::Number(7.0));
    assert_eq!(set.get("free_form"), Some(&ParameterValue::Number(7.0)));
}

#[test]
fn test_describe_changes() {
    let descs = descriptors();
    let mut set = ParameterSet::defaults(&descs);
    assert_eq!(set.describe_changes(&descs), "Default model");

    set.set(&descs, "elasmu", ParameterValue::Number(3.0));
    set.set(&descs, "damages_model", ParameterValue::Choice("weitzman".into()));
    assert_eq!(
        set.describe_changes(&descs),
        "Elasticity of marginal utility: 3.00 (2.00)\nDamage function: Weitzman (DICE 2007)"
    );
}

#[test]
fn test_json_forms() {
    let descs = descriptors();
    let set = ParameterSet::defaults(&descs);
    let body = serde_json::Value::Object(set.to_json());
    assert_eq!(body, serde_json::json!({"elasmu": 2.0, "damages_model": "dice2007"}));

    let parsed: Vec<ParameterDescriptor> = serde_json::from_str(
        r#"[{"name": "Savings rate", "machine_name": "savings", "type": "range",
             "min": 0.1, "max": 0.4, "step": 0.01, "default": 0.22}]"#,
    )
    .unwrap();
    assert!(matches!(parsed[0].kind, ParameterKind::Range { step, .. } if step == 0.01));
}
