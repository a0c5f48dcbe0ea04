//! `tourguide search`: score a query against the knowledge index offline.

use anyhow::Context;

use tg_domain::config::Config;
use tg_knowledge::KnowledgeIndex;

pub fn run(
    config: &Config,
    query: &str,
    limit: Option<usize>,
    min_score: f64,
    json: bool,
) -> anyhow::Result<()> {
    let path = &config.knowledge.index_path;
    let index = KnowledgeIndex::load(path)
        .with_context(|| format!("loading knowledge index {}", path.display()))?;

    let limit = limit.unwrap_or(config.knowledge.default_limit);
    let matches = index.search_filtered(query, limit, min_score);

    if json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(());
    }

    if matches.is_empty() {
        println!("No matches for {query:?} in {} entries.", index.len());
        return Ok(());
    }

    println!("{:>7}  {:<24}  NAME", "SCORE", "ID");
    for m in &matches {
        println!("{:>7.1}  {:<24}  {}", m.score, m.entry.id, m.entry.name);
        for h in &m.highlights {
            println!("{:>7}  {:<24}  > {h}", "", "");
        }
    }
    Ok(())
}
