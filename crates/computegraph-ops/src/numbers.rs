//! Arithmetic and numeric comparison

use computegraph_core::opstore::names;
use computegraph_core::{Graph, GraphFragment, OpDef, OpStore, RenderInfo, Result, Type};

fn binary(name: &str, repr: &str, output: Type, description: &str) -> OpDef {
    OpDef::new(name)
        .arg("lhs", Type::number(), "The left operand")
        .arg("rhs", Type::number(), "The right operand")
        .returns(output)
        .render(RenderInfo::binary(repr))
        .description(description)
        .return_description("The result of the operation")
}

fn unary(name: &str, render: RenderInfo, description: &str) -> OpDef {
    OpDef::new(name)
        .arg("val", Type::number(), "The number to operate on")
        .returns(Type::number())
        .render(render)
        .description(description)
        .return_description("The resulting number")
}

pub(crate) fn register(store: &mut OpStore) -> Result<()> {
    store.register_op(binary("number-add", "+", Type::number(), "Adds two numbers"))?;
    store.register_op(binary("number-sub", "-", Type::number(), "Subtracts one number from another"))?;
    store.register_op(binary("number-mult", "*", Type::number(), "Multiplies two numbers"))?;
    store.register_op(binary("number-div", "/", Type::number(), "Divides one number by another"))?;
    store.register_op(binary("number-modulo", "%", Type::number(), "Remainder of dividing two numbers"))?;
    store.register_op(binary(names::NUMBER_EQUAL, "==", Type::boolean(), "Whether two numbers are equal"))?;
    store.register_op(binary("number-notEqual", "!=", Type::boolean(), "Whether two numbers differ"))?;
    store.register_op(binary("number-less", "<", Type::boolean(), "Whether the left number is smaller"))?;
    store.register_op(binary("number-greater", ">", Type::boolean(), "Whether the left number is larger"))?;
    store.register_op(unary("number-negate", RenderInfo::unary("-"), "Negates a number"))?;
    store.register_op(unary("number-abs", RenderInfo::Chain, "Absolute value of a number"))?;
    store.register_op(unary("number-floor", RenderInfo::Chain, "Rounds a number down"))?;

    let body = percent_of_body(store)?;
    store.register_op(
        OpDef::new("number-percentOf")
            .arg("part", Type::number(), "The part")
            .arg("whole", Type::number(), "The whole")
            .returns(Type::number())
            .render(RenderInfo::Function)
            .body(body)
            .description("Expresses one number as a percentage of another")
            .return_description("part / whole * 100"),
    )?;
    Ok(())
}

/// `number-mult(number-div(part, whole), 100)`
fn percent_of_body(store: &OpStore) -> Result<GraphFragment> {
    let mut graph = Graph::new();
    let part = graph.var("part", Type::number());
    let whole = graph.var("whole", Type::number());
    let ratio = store.make_op_positional(&mut graph, "number-div", &[part, whole])?;
    let hundred = graph.const_int(100);
    let root = store.make_op_positional(&mut graph, "number-mult", &[ratio, hundred])?;
    Ok(GraphFragment::new(graph, root))
}
