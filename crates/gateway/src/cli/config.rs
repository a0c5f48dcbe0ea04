//! `tourguide config validate|show`.

use tg_domain::config::{Config, ConfigSeverity};
use tg_knowledge::KnowledgeIndex;

/// Print every config issue plus a knowledge index load check. Returns
/// `false` when anything would stop the server from starting.
pub fn validate(config: &Config, config_path: &str) -> bool {
    let issues = config.validate();
    let mut errors = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();

    for issue in &issues {
        println!("{issue}");
    }

    let index_path = &config.knowledge.index_path;
    if index_path.exists() {
        match KnowledgeIndex::load(index_path) {
            Ok(index) => println!(
                "knowledge: {} entries from {}",
                index.len(),
                index_path.display()
            ),
            Err(e) => {
                println!("[ERROR] knowledge.index_path: {e}");
                errors += 1;
            }
        }
    } else {
        println!(
            "[WARN] knowledge.index_path: {} does not exist; the guide will start with no entries",
            index_path.display()
        );
    }

    if errors == 0 {
        println!("{config_path}: OK ({} warning(s))", issues.len());
    } else {
        println!("{config_path}: {errors} error(s)");
    }
    errors == 0
}

/// Print the resolved config as TOML. A plaintext API key is masked.
pub fn show(config: &Config) {
    let mut redacted = config.clone();
    if redacted.llm.auth.key.is_some() {
        redacted.llm.auth.key = Some("********".into());
    }
    match toml::to_string_pretty(&redacted) {
        Ok(output) => print!("{output}"),
        Err(e) => {
            eprintln!("failed to render config: {e}");
            std::process::exit(1);
        }
    }
}
