use computegraph_core::opstore::names;
use computegraph_core::{OpDef, OpStore, RenderInfo, Result, Type};

pub(crate) fn register(store: &mut OpStore) -> Result<()> {
    for (name, repr, description) in [
        (names::AND, "and", "Logical conjunction"),
        ("or", "or", "Logical disjunction"),
    ] {
        store.register_op(
            OpDef::new(name)
                .arg("lhs", Type::boolean(), "The first condition")
                .arg("rhs", Type::boolean(), "The second condition")
                .returns(Type::boolean())
                .render(RenderInfo::binary(repr))
                .description(description)
                .return_description("The combined condition"),
        )?;
    }
    store.register_op(
        OpDef::new("boolean-not")
            .arg("bool", Type::boolean(), "The condition to negate")
            .returns(Type::boolean())
            .render(RenderInfo::unary("!"))
            .description("Logical negation")
            .return_description("The negated condition"),
    )?;
    Ok(())
}
