use anyhow::{bail, Result};
use padherder_cache::{
    cli::{Cli, Commands},
    download::{CacheManager, PadherderClient},
    filter::resolve_kinds,
    loader::{load_cached, load_table},
    parser::Cell,
    schema::{DatasetKind, ALL_SCHEMAS},
    ui, DataDict, DataLoader, LogUi, SilentUi, UiApp,
};
use serde::Serialize;
use serde_json::Map;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// One decoded row, keyed by field name
#[derive(Serialize)]
struct RowView {
    index: usize,
    fields: Map<String, serde_json::Value>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse_args();

    match cli.command {
        Commands::Sync {
            data_dir,
            base_url,
            include,
            exclude,
            force,
            tui,
        } => {
            let start = Instant::now();

            let kinds = resolve_kinds(include, exclude)?;
            let cache = CacheManager::new(data_dir)?;
            if force {
                for kind in &kinds {
                    cache.clear(*kind)?;
                }
            }

            let loader = DataLoader::new(PadherderClient::new()?, cache).with_base_url(base_url);

            let data = if tui {
                let mut app = UiApp::new()?;
                match loader.load_game_data(&kinds, &mut app) {
                    Ok(data) => {
                        app.finish(&summary(&data))?;
                        data
                    }
                    Err(e) => {
                        app.restore()?;
                        return Err(e);
                    }
                }
            } else {
                loader.load_game_data(&kinds, &mut LogUi)?
            };

            println!("{}", summary(&data));
            println!(
                "\nLoaded {} tables from {:?} in {:.1}s",
                data.len(),
                loader.cache().cache_dir(),
                start.elapsed().as_secs_f64()
            );
        }

        Commands::Show { data_dir } => {
            let cache = CacheManager::new(data_dir)?;
            let data = load_cached(&cache, &DatasetKind::ALL, &mut SilentUi::new())?;
            if data.is_empty() {
                bail!("Nothing cached in {:?}, run `sync` first", cache.cache_dir());
            }
            ui::browse(&data)?;
        }

        Commands::Inspect {
            table,
            data_dir,
            limit,
            json,
        } => {
            let cache = CacheManager::new(data_dir)?;
            let table = load_table(&cache, &table)?;
            let fields = table.schema().fields;

            for (index, row) in table.rows().take(limit).enumerate() {
                if json {
                    let view = RowView {
                        index,
                        fields: fields
                            .iter()
                            .zip(row)
                            .map(|(field, cell)| Ok((field.name.to_string(), serde_json::to_value(cell)?)))
                            .collect::<Result<_, serde_json::Error>>()?,
                    };
                    println!("{}", serde_json::to_string(&view)?);
                } else {
                    let cells: Vec<String> = fields
                        .iter()
                        .zip(&row)
                        .map(|(field, cell)| format!("{}={}", field.name, display_cell(cell)))
                        .collect();
                    println!("[{}] {}", index, cells.join(" "));
                }
            }

            if !json {
                println!("\n{} of {} records", limit.min(table.len()), table.len());
            }
        }

        Commands::ListDatasets => {
            println!("Available tables:\n");
            for schema in ALL_SCHEMAS {
                println!("  {} ({} bytes per record)", schema.name, schema.record_size());
                for field in schema.fields {
                    println!("    {:<16} {}", field.name, field.field_type);
                }
            }
        }
    }

    Ok(())
}

fn summary(data: &DataDict) -> String {
    data.iter()
        .map(|(name, table)| format!("{}: {} rows", name, table.len()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn display_cell(cell: &Cell) -> String {
    match cell {
        Cell::Text(_) => format!("{:?}", cell.to_string()),
        other => other.to_string(),
    }
}
