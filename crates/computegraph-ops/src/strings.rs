//! String ops

use computegraph_core::opstore::names;
use computegraph_core::{OpDef, OpStore, RenderInfo, Result, Type};

pub(crate) fn register(store: &mut OpStore) -> Result<()> {
    for (name, repr, description) in [
        (names::STRING_EQUAL, "==", "Whether two strings are equal"),
        ("string-notEqual", "!=", "Whether two strings differ"),
    ] {
        store.register_op(
            OpDef::new(name)
                .arg("lhs", Type::string(), "The left string")
                .arg("rhs", Type::string(), "The right string")
                .returns(Type::boolean())
                .render(RenderInfo::binary(repr))
                .description(description)
                .return_description("The comparison result"),
        )?;
    }

    store.register_op(
        OpDef::new("string-add")
            .arg("lhs", Type::string(), "The first string")
            .arg("rhs", Type::string(), "The string to append")
            .returns(Type::string())
            .render(RenderInfo::binary("+"))
            .description("Concatenates two strings")
            .return_description("The joined string"),
    )?;

    for (name, output, description) in [
        ("string-len", Type::number(), "Length of a string in characters"),
        ("string-lower", Type::string(), "Lowercases a string"),
        ("string-upper", Type::string(), "Uppercases a string"),
    ] {
        store.register_op(
            OpDef::new(name)
                .arg("str", Type::string(), "The string to operate on")
                .returns(output)
                .description(description)
                .return_description("The result of the operation"),
        )?;
    }

    store.register_op(
        OpDef::new("string-contains")
            .arg("str", Type::string(), "The string to search")
            .arg("sub", Type::string(), "The substring to look for")
            .returns(Type::boolean())
            .description("Whether a string contains a substring")
            .return_description("True when the substring occurs"),
    )?;

    store.register_op(
        OpDef::new("string-split")
            .arg("str", Type::string(), "The string to split")
            .arg("sep", Type::string(), "The separator")
            .returns(Type::list(Type::string()))
            .description("Splits a string on a separator")
            .return_description("The pieces between separators"),
    )?;
    Ok(())
}
