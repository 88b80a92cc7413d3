use std::sync::Arc;
use std::thread;

use jschema::{ErrorCode, JSchema, Rule};

fn with_types(src: &str, types: &[(&str, &str)]) -> JSchema {
    let mut schema = JSchema::new("root.jschema", src);
    for (name, body) in types {
        schema.add_type(name, &JSchema::new(format!("{name}.jschema"), *body)).unwrap();
    }
    schema
}

#[test]
fn property_validation_scenario() {
    let schema = JSchema::new("root.jschema", "{\"id\": 123 // {min: 1}\n}");
    schema.compile().unwrap();
    let err = schema.validate_object_property("id", b"0").unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValueTooSmall);
    schema.validate_object_property("id", b"5").unwrap();
}

#[test]
fn recursion_through_required_properties_is_rejected() {
    let schema = with_types("{}", &[("@Node", "{\"next\": @Node}")]);
    let err = schema.check().unwrap_err();
    assert_eq!(err.code(), ErrorCode::InfiniteRecursion);
    assert!(err.message().contains("@Node -> @Node"), "{}", err.message());

    let schema = with_types("{}", &[("@A", "{\"b\": @B}"), ("@B", "{\"a\": @A}")]);
    let err = schema.check().unwrap_err();
    assert_eq!(err.code(), ErrorCode::InfiniteRecursion);
    assert!(err.message().contains("@A -> @B -> @A"), "{}", err.message());
}

#[test]
fn lazy_recursion_is_accepted() {
    with_types("{}", &[("@List", "{\"value\": 1, \"next\": @List // {optional: true}\n}")]).check().unwrap();
    with_types("{}", &[("@Tree", "{\"children\": [@Tree]}")]).check().unwrap();
}

#[test]
fn linked_list_values() {
    let schema = with_types(
        "@List",
        &[("@List", "{\"value\": 1, \"next\": @List // {optional: true}\n}")],
    );
    schema.validate(br#"{"value": 1, "next": {"value": 2}}"#).unwrap();
    let err = schema.validate(br#"{"value": 1, "next": {"value": "2"}}"#).unwrap_err();
    assert_eq!(err.code(), ErrorCode::TypeMismatch);
}

#[test]
fn all_of_merges_parent_properties() {
    let schema = with_types("{\"b\": 2} // {allOf: \"@Base\"}", &[("@Base", "{\"a\": 1}")]);
    schema.validate(br#"{"a": 1, "b": 2}"#).unwrap();
    assert_eq!(schema.validate(br#"{"b": 2}"#).unwrap_err().code(), ErrorCode::RequiredKeyMissing);

    let schema = with_types("{\"a\": 2} // {allOf: \"@Base\"}", &[("@Base", "{\"a\": 1}")]);
    assert_eq!(schema.check().unwrap_err().code(), ErrorCode::AllOfDuplicateKey);

    let schema = with_types("{} // {allOf: \"@Base\"}", &[("@Base", "[1]")]);
    assert_eq!(schema.check().unwrap_err().code(), ErrorCode::AllOfNotObject);
}

#[test]
fn enum_rules_are_resolved_at_compile_time() {
    let mut schema = JSchema::new("root.jschema", "{\"color\": \"red\" // {enum: \"@Color\"}\n}");
    schema.add_rule("@Color", Rule::enum_rule("color.jschema", "[\"red\", \"green\"]").unwrap()).unwrap();
    schema.validate_object_property("color", b"\"green\"").unwrap();
    let err = schema.validate_object_property("color", b"\"blue\"").unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotInEnum);

    let schema = JSchema::new("root.jschema", "\"red\" // {enum: \"@Color\"}");
    assert_eq!(schema.check().unwrap_err().code(), ErrorCode::RuleNotFound);
}

#[test]
fn errors_render_as_documents() {
    let schema = JSchema::new("root.jschema", "{\n  \"name\": \"x\" // {min: 1}\n}");
    let err = schema.check().unwrap_err();
    let document = err.document().unwrap();
    assert_eq!(document.file_name, "root.jschema");
    assert_eq!(document.line, 2);
    assert_eq!(document.code, 401);
    assert!(document.to_string().contains("\"name\": \"x\" // {min: 1}"));
}

#[test]
fn concurrent_callers_see_one_outcome() {
    let schema = Arc::new(with_types("{\"pet\": @Cat | @Dog}", &[("@Cat", "{\"meow\": true}"), ("@Dog", "{\"bark\": true}")]));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let schema = schema.clone();
            thread::spawn(move || {
                schema.compile().unwrap();
                let value = if i % 2 == 0 { r#"{"pet": {"meow": false}}"# } else { r#"{"pet": {"bark": true}}"# };
                schema.validate(value.as_bytes())
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }
    assert_eq!(schema.used_user_types().unwrap(), vec!["@Cat", "@Dog"]);
}

#[test]
fn failed_compilation_is_remembered() {
    let schema = Arc::new(JSchema::new("root.jschema", "[1, 2] // {maxItems: 1}"));
    let codes: Vec<_> = (0..4)
        .map(|_| {
            let schema = schema.clone();
            thread::spawn(move || schema.compile().unwrap_err().code())
        })
        .map(|handle| handle.join().unwrap())
        .collect();
    assert_eq!(codes, vec![ErrorCode::ArrayItemsCount; 4]);
}

#[test]
fn rules_next_to_a_type_reference_are_rejected() {
    let schema = with_types("{\"a\": \"ab\" // {type: \"@Str\", maxLength: 3}\n}", &[("@Str", "\"x\"")]);
    assert_eq!(schema.compile().unwrap_err().code(), ErrorCode::RulesWithTypeReference);
    assert_eq!(schema.validate(br#"{"a": "abcdefgh"}"#).unwrap_err().code(), ErrorCode::RulesWithTypeReference);
}

#[test]
fn deep_nesting_fails_cleanly() {
    let nested = |depth: usize| format!("{}{}", "[".repeat(depth), "]".repeat(depth));

    let schema = JSchema::new("root.jschema", nested(1000));
    assert_eq!(schema.compile().unwrap_err().code(), ErrorCode::NestingTooDeep);
    JSchema::new("root.jschema", nested(200)).compile().unwrap();

    let schema = JSchema::new("root.jschema", "[]");
    let err = schema.validate(nested(200_000).as_bytes()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NestingTooDeep);
}
