use anyhow::{Context, Result};
use colored::Colorize;
use computegraph_core::serialize::{graph_from_json, graph_to_json};
use computegraph_core::{is_assignable_to, EngineConfig, OpDef, RefineCache, Refiner, Simplifier, Stack, Type};
use computegraph_ops::{standard_op_store, ScriptedExecutor};
use serde_json::Value;
use std::path::Path;
use tracing::info;

fn read_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn read_type(path: &Path) -> Result<Type> {
    let value = read_json(path)?;
    Type::from_json(&value).with_context(|| format!("decoding type in {}", path.display()))
}

fn executor(config: &EngineConfig, responses: Option<&Path>) -> Result<ScriptedExecutor> {
    let store = standard_op_store(&config.store)?;
    match responses {
        Some(path) => ScriptedExecutor::from_json(store, &read_json(path)?),
        None => Ok(ScriptedExecutor::new(store)),
    }
}

fn signature(def: &OpDef) -> String {
    let inputs: Vec<String> = def
        .input_types
        .iter()
        .map(|(name, ty)| format!("{name}: {ty}"))
        .collect();
    format!("({})", inputs.join(", "))
}

pub fn ops(config: &EngineConfig, input_type: Option<&str>, all: bool) -> Result<()> {
    let store = standard_op_store(&config.store)?;
    let filter = input_type
        .map(|text| -> Result<Type> {
            let value: Value = serde_json::from_str(text).context("parsing --input-type")?;
            Ok(Type::from_json(&value)?)
        })
        .transpose()?;

    let mut listed = 0;
    for def in store.ops() {
        if def.hidden && !all {
            continue;
        }
        if let Some(ty) = &filter {
            if !def.first_input_type().is_some_and(|first| is_assignable_to(ty, first)) {
                continue;
            }
        }
        let name = if def.hidden { def.name.as_str().dimmed() } else { def.name.as_str().bold() };
        println!("{} {} [{}]", name, signature(def), def.render_info.category().cyan());
        if let Some(description) = &def.description {
            println!("    {}", description);
        }
        listed += 1;
    }
    info!("listed {} of {} ops", listed, store.len());
    Ok(())
}

pub fn check(from: &Path, to: &Path) -> Result<bool> {
    let from_ty = read_type(from)?;
    let to_ty = read_type(to)?;
    let ok = is_assignable_to(&from_ty, &to_ty);
    if ok {
        println!("{} {} is assignable to {}", "✓".green(), from_ty, to_ty);
    } else {
        println!("{} {} is not assignable to {}", "✗".red(), from_ty, to_ty);
    }
    Ok(ok)
}

pub async fn refine(config: &EngineConfig, graph_path: &Path, responses: Option<&Path>, emit: bool) -> Result<()> {
    let executor = executor(config, responses)?;
    let text = std::fs::read_to_string(graph_path).with_context(|| format!("reading {}", graph_path.display()))?;
    let (mut graph, roots) = graph_from_json(&text)?;

    let refiner = Refiner::new(&executor).with_config(config.refine.clone());
    let mut cache = RefineCache::new();
    let mut refined = Vec::with_capacity(roots.len());
    for root in &roots {
        refined.push(refiner.refine(&mut graph, *root, &Stack::new(), &mut cache).await?);
    }
    info!("refined {} roots, {} cache hits", refined.len(), cache.hits());

    if emit {
        println!("{}", graph_to_json(&graph, &refined)?);
        return Ok(());
    }
    for (i, root) in refined.iter().enumerate() {
        let ty = graph.ty(*root);
        let shown = if ty.is_invalid() {
            ty.to_string().as_str().red()
        } else {
            ty.to_string().as_str().green()
        };
        let op = graph.node(*root).op_name().unwrap_or("-");
        println!("root {}: {} {}", i, op.bold(), shown);
    }
    Ok(())
}

pub async fn simplify(config: &EngineConfig, graph_path: &Path, responses: Option<&Path>) -> Result<()> {
    let executor = executor(config, responses)?;
    let text = std::fs::read_to_string(graph_path).with_context(|| format!("reading {}", graph_path.display()))?;
    let (mut graph, roots) = graph_from_json(&text)?;

    let simplifier = Simplifier::new(&executor).with_config(config.simplify.clone());
    let mut simplified = Vec::with_capacity(roots.len());
    for root in &roots {
        simplified.push(simplifier.simplify(&mut graph, *root).await?);
    }
    let changed = roots.iter().zip(&simplified).filter(|(a, b)| a != b).count();
    info!(
        "simplified {} of {} roots using {} queries",
        changed,
        roots.len(),
        executor.queried().len()
    );
    println!("{}", graph_to_json(&graph, &simplified)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use computegraph_core::Executor;
    use std::io::Write;

    fn temp_json(value: &Value) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", value).unwrap();
        file
    }

    #[test]
    fn test_check_reports_assignability() {
        let int = temp_json(&serde_json::json!("int"));
        let maybe_number = temp_json(&serde_json::json!({"type": "union", "members": ["none", "number"]}));
        assert!(check(int.path(), maybe_number.path()).unwrap());
        assert!(!check(maybe_number.path(), int.path()).unwrap());
    }

    #[test]
    fn test_check_rejects_malformed_type() {
        let bad = temp_json(&serde_json::json!({"type": "nonsense"}));
        let int = temp_json(&serde_json::json!("int"));
        assert!(check(bad.path(), int.path()).is_err());
    }

    #[test]
    fn test_executor_reads_responses() {
        let responses = temp_json(&serde_json::json!({"artifact-name": "model"}));
        let executor = executor(&EngineConfig::default(), Some(responses.path())).unwrap();
        assert!(executor.op_store().contains("artifact-name"));
    }

    #[tokio::test]
    async fn test_refine_command_runs_on_serialized_graph() {
        let graph = temp_json(&serde_json::json!({
            "nodes": [
                {"nodeType": "const", "type": "number", "val": 1},
                {"nodeType": "const", "type": "number", "val": 2},
                {"nodeType": "output", "type": "any",
                 "fromOp": {"name": "number-add", "inputs": {"lhs": 0, "rhs": 1}}}
            ],
            "roots": [2]
        }));
        refine(&EngineConfig::default(), graph.path(), None, true).await.unwrap();
    }
}
