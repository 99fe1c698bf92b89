//! Demo command handler.

use std::path::PathBuf;
use std::process::ExitCode;

use cogmesh::JsonSnapshotStore;
use cogmesh::models::Metadata;
use cogmesh::rendering::AsciiRenderer;
use cogmesh::services::{
    IterationEngine, SAMPLE_GRAPH_ID, SAMPLE_SCORE_SET_ID, sample_policy, sample_system,
};

/// Demo command.
pub fn cmd_demo(snapshot: Option<PathBuf>) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut system = sample_system()?;
    let policy = sample_policy();
    system.bind_graph_policy(SAMPLE_GRAPH_ID, policy.clone())?;

    let result = {
        let mut engine = IterationEngine::new(&mut system);
        engine.run_manual_reorder(SAMPLE_GRAPH_ID, &policy)?;
        engine.build_chain(SAMPLE_GRAPH_ID, &policy, None, None)?
    };

    println!("{}", AsciiRenderer::render_graph(&system, SAMPLE_GRAPH_ID, true)?);
    println!();
    println!(
        "{}",
        AsciiRenderer::render_similarity(
            &mut system,
            SAMPLE_GRAPH_ID,
            SAMPLE_SCORE_SET_ID,
            policy.direction_mode
        )?
    );
    println!();
    println!("{}", AsciiRenderer::render_chain(&result));
    println!("Grouped neighbors: {:?}", result.grouped_neighbors);
    println!();

    let mut fields = Metadata::new();
    fields.insert("content".to_string(), "invoicing pipeline".into());
    let report = system.update_cog("C", &fields)?;
    println!(
        "After updating cog C content ({} score set(s) rescored, {} graph(s) reordered):",
        report.score_sets_rescored.len(),
        report.graphs_reordered.len()
    );
    println!("{}", AsciiRenderer::render_graph(&system, SAMPLE_GRAPH_ID, true)?);

    if let Some(path) = snapshot {
        let mut meta = Metadata::new();
        meta.insert("purpose".to_string(), "iteration baseline".into());
        JsonSnapshotStore::save(&path, &system.snapshot("demo-1", Some(meta)))?;
        println!();
        println!("Saved snapshot to {}", path.display());
    }
    Ok(ExitCode::SUCCESS)
}
