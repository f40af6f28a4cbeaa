use std::fs;
use std::path::PathBuf;

use general::prelude::*;
use integration_tests::Fixture;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

#[rstest]
fn integration_valid(#[files("fixtures/valid/*.general")] path: PathBuf) {
    let fixture = Fixture::load(path);

    let template = Template::compile_named(&fixture.source, fixture.name())
        .unwrap_or_else(|err| panic!("{}", report(&err, &fixture.source, &fixture.name())));

    assert_eq!(Ok(fixture.expected), template.apply(&fixture.data));
}

#[rstest]
fn integration_invalid(#[files("fixtures/invalid/*.general")] path: PathBuf) {
    let source = fs::read_to_string(path).expect("unable to read test file");

    assert!(matches!(
        Template::compile(&source),
        Err((GeneralError::ParseError(_), _))
    ));
}

#[rstest]
#[case::plain_text("plain text", json!({"plain": 1}), "plain text")]
#[case::default("@(name: \"fallback\")", json!({}), "fallback")]
#[case::data_over_default("@(name: \"fallback\")", json!({"name": "X"}), "X")]
#[case::money_eur("@(amount -> money: EUR)", json!({"amount": -150}), "-€1.5")]
#[case::money_usd("@(amount -> money: USD)", json!({"amount": 1050}), "$10.5")]
#[case::array(
    "@[item] @(item) @[, ]",
    json!({"item": [{"item": "a"}, {"item": "b"}, {"item": "c"}]}),
    "a, b, c"
)]
#[case::time_first_hour("@(t -> time)", json!({"t": 61}), "1:01:01 AM")]
#[case::time_noon("@(t -> time)", json!({"t": 43200}), "1:00:00 PM")]
#[case::capitalize_all("@(s -> capitalize all)", json!({"s": "hello world"}), "Hello World")]
#[case::capitalize_first("@(s -> capitalize)", json!({"s": "hello world"}), "Hello world")]
#[case::splitwords("@(s -> splitwords \"2\")", json!({"s": "a b c"}), r#"["a b", "c"]"#)]
fn renders(#[case] source: &str, #[case] data: serde_json::Value, #[case] expected: &str) {
    let data = Data::try_from(data).unwrap();

    assert_eq!(Ok(expected.to_string()), template(source, &data));
}

#[rstest]
#[case::unsupported_currency(
    "@(amount -> money GBP)",
    json!({"amount": 1}),
    RenderError::Operation(OperationError::UnsupportedCurrency("GBP".to_string()))
)]
#[case::type_mismatch(
    "@(amount -> money)",
    json!({"amount": "1"}),
    RenderError::Operation(OperationError::TypeMismatch {
        operation: "money".to_string(),
        expected: "integer".to_string(),
        found: "string".to_string(),
    })
)]
#[case::unknown_operation(
    "@(a -> shout)",
    json!({"a": "x"}),
    RenderError::Operation(OperationError::UnknownOperation("shout".to_string()))
)]
#[case::missing_list("@[xs] @(x) @[]", json!({}), RenderError::UndefinedKey("xs".to_string()))]
fn fails_to_render(
    #[case] source: &str,
    #[case] data: serde_json::Value,
    #[case] expected: RenderError,
) {
    let template = Template::compile(source).unwrap();
    let data = Data::try_from(data).unwrap();

    assert_eq!(Err(GeneralError::RenderError(expected)), template.apply(&data));
}

#[test]
fn renders_config_data_from_toml() {
    let mut data = Data::from_toml(concat!(
        "[site]\nname = \"general\"\n\n",
        "[[pages]]\ntitle = \"home\"\n\n",
        "[[pages]]\ntitle = \"about\"\n",
    ))
    .unwrap();

    data.set_path("site.name", "General").unwrap();
    let site = data.get_path("site").unwrap().clone();
    data.insert("site", site["name"].clone());

    let template = Template::compile("@(site): @[pages] @(title -> uppercase) @[ | ]").unwrap();

    assert_eq!(Ok("General: HOME | ABOUT".to_string()), template.apply(&data));
}

#[test]
fn dotted_paths() {
    let mut data = Data::try_from(json!({"a": {"b": 5}})).unwrap();

    assert_eq!(Ok(&json!(5)), data.get_path("a.b"));
    assert_eq!(
        Err(AccessError::UndefinedPath("a.c".to_string())),
        data.get_path("a.c")
    );
    assert_eq!(
        Err(AccessError::UndefinedPath("x.y".to_string())),
        data.set_path("x.y", 1)
    );
}

#[test]
fn extracts_data_from_rendered_text() {
    let template = Template::compile("Order @(id): @[lines] @(qty) x @(item) @[, ]").unwrap();
    let data = Data::try_from(json!({
        "id": "42",
        "lines": [{"qty": "2", "item": "tea"}, {"qty": "1", "item": "cake"}]
    }))
    .unwrap();

    let rendered = template.apply(&data).unwrap();

    assert_eq!("Order 42: 2 x tea, 1 x cake", rendered);
    assert_eq!(Ok(Some(data)), template.extract(&rendered));
}
