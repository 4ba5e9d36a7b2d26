//! `tripcover doctor`: diagnose configuration and connectivity.

use tripcover_config::{API_KEY_ENV, AppConfig};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 TripCover Doctor: System Diagnostics");
    println!("========================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_path();
    if config_path.exists() {
        println!("  ✅ Config file found: {}", config_path.display());
    } else {
        println!("  ⚠️  No config file, using defaults. Run `tripcover onboard` to create one");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config file invalid: {e}");
            println!("\n  ⚠️  Fix the config file and re-run doctor.");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  ✅ API key configured");
    } else {
        println!("  ❌ No API key: set {API_KEY_ENV} or add api_key to config.toml");
        issues += 1;
    }

    for path in config.reference.document_paths() {
        if path.exists() {
            println!("  ✅ Policy document: {}", path.display());
        } else {
            println!("  ⚠️  Policy document missing: {}", path.display());
            issues += 1;
        }
    }

    let table = config.reference.destination_table_path();
    if table.exists() {
        println!("  ✅ Destination list: {}", table.display());
    } else {
        println!("  ⚠️  Destination list missing: {}", table.display());
        issues += 1;
    }

    if config.has_api_key() {
        let provider = tripcover_providers::build_from_config(&config);
        match provider.health_check().await {
            Ok(true) => println!("  ✅ Provider '{}' reachable", provider.name()),
            Ok(false) => {
                println!("  ❌ Provider '{}' responded but is not healthy", provider.name());
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Provider '{}' unreachable: {e}", provider.name());
                issues += 1;
            }
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
