use netmeta::cli::{Cli, Commands, ConfigAction};
use netmeta::config::{expand_path, Config};
use netmeta::error::{NetmetaError, Result};
use netmeta::filtering::{
    enrich, should_drop, AttributeMap, FilterDecision, InterfaceTable, MetadataSnapshot,
    MetricTable, Record, RecordFilter, SnapshotStore, INTERFACE_PREFIX,
};
use netmeta::pipeline::{JsonLinesFormatter, Pipeline, PipelineSettings, RecordEvent};
use netmeta::registry::RegistryLoader;
use netmeta::sink::{Compression, HttpSink, Sink};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    // Handle commands
    match cli.command {
        Commands::Check {
            attrs,
            interfaces,
            interface,
            show_attrs,
        } => {
            cmd_check(cli.config, &attrs, interfaces, interface, show_attrs)?;
        }
        Commands::Run { input, interfaces } => {
            cmd_run(cli.config, input, interfaces)?;
        }
        Commands::Mibs { paths, oid } => {
            cmd_mibs(cli.config, paths, oid)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "netmeta=debug" } else { "netmeta=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_check(
    config_path: Option<PathBuf>,
    attrs_path: &Path,
    interfaces_path: Option<PathBuf>,
    interface: Option<u32>,
    show_attrs: bool,
) -> Result<()> {
    let config = load_config(config_path)?;

    let mut attrs: AttributeMap = read_json(attrs_path)?;
    let interfaces: InterfaceTable = match interfaces_path {
        Some(path) => read_json(&path)?,
        None => InterfaceTable::new(),
    };

    let snapshot = MetadataSnapshot::from_config(&config.filter, interfaces)?;

    let mut record = Record::new();
    if let Some(id) = interface {
        record = record.with_interface(id);
    }

    enrich(&mut attrs, &record, &MetricTable::new(), &snapshot);
    let interface_scoped = attrs.keys().any(|k| k.starts_with(INTERFACE_PREFIX));
    let decision = FilterDecision::from_drop(should_drop(&attrs, &snapshot, interface_scoped));

    match decision {
        FilterDecision::Keep => println!("keep"),
        FilterDecision::Drop => println!("drop"),
    }

    if show_attrs {
        let json = serde_json::to_string_pretty(&attrs).map_err(|e| NetmetaError::Json {
            source: e,
            context: "Failed to serialize attributes".to_string(),
        })?;
        println!("{}", json);
    }

    Ok(())
}

fn cmd_run(
    config_path: Option<PathBuf>,
    input: Option<PathBuf>,
    interfaces_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config_path)?;
    if config.sink.compression != Compression::None {
        return Err(NetmetaError::InvalidConfigValue {
            path: "sink.compression".to_string(),
            message: format!(
                "'{}' needs a compressing formatter; run writes plain JSON lines",
                config.sink.compression
            ),
        });
    }

    let interfaces: InterfaceTable = match interfaces_path {
        Some(path) => read_json(&path)?,
        None => InterfaceTable::new(),
    };
    let snapshots = Arc::new(SnapshotStore::new(MetadataSnapshot::from_config(
        &config.filter,
        interfaces,
    )?));
    let filter = Arc::new(RecordFilter::new(snapshots));
    let settings = PipelineSettings::from_config(&config.pipeline)?;

    let reader: Box<dyn BufRead> = match input {
        Some(path) => {
            let file = std::fs::File::open(&path).map_err(|e| NetmetaError::Io {
                source: e,
                context: format!("Failed to open {:?}", path),
            })?;
            Box::new(std::io::BufReader::new(file))
        }
        None => Box::new(std::io::BufReader::new(std::io::stdin())),
    };

    let rt = tokio::runtime::Runtime::new().map_err(|e| NetmetaError::Io {
        source: e,
        context: "Failed to create tokio runtime".to_string(),
    })?;

    rt.block_on(async {
        let sink = HttpSink::new(&config.sink)?;
        let pipeline = Pipeline::new(
            filter,
            Arc::new(JsonLinesFormatter),
            Arc::new(sink.clone()),
            settings,
        );

        for (lineno, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| NetmetaError::Io {
                source: e,
                context: "Failed to read record input".to_string(),
            })?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<RecordEvent>(&line) {
                Ok(event) => pipeline.send(event).await?,
                Err(e) => tracing::warn!("Skipping malformed record on line {}: {}", lineno + 1, e),
            }
        }

        let stats = pipeline.shutdown().await;
        sink.flush().await;

        let (wins, errors) = sink.delivery_counts();
        println!(
            "Kept {} / dropped {} records; {} batches delivered, {} delivery errors",
            stats.kept, stats.dropped, wins, errors
        );
        for (name, rate) in sink.http_info() {
            tracing::debug!("{}: {:.3}/s", name, rate);
        }
        sink.close();

        Ok::<(), NetmetaError>(())
    })
}

fn cmd_mibs(config_path: Option<PathBuf>, paths: Vec<PathBuf>, oid: Option<String>) -> Result<()> {
    let paths = if paths.is_empty() {
        let config = load_config(config_path)?;
        vec![expand_path(&config.registry.descriptor_dir)?]
    } else {
        paths
    };

    let mut loader = RegistryLoader::new();
    let mut failures = 0;
    for path in &paths {
        if path.is_dir() {
            let report = loader.load_dir(path)?;
            failures += report.failed.len();
        } else if let Err(e) = loader.load(path) {
            tracing::warn!("Skipping trap descriptor {}: {}", path.display(), e);
            failures += 1;
        }
    }
    let registry = loader.finish();

    match oid {
        Some(oid) => {
            let mut found = false;
            if let Some(trap) = registry.trap(&oid) {
                found = true;
                println!("Trap {} ({})", trap.name, trap.oid);
                println!("  drop_undefined: {}", trap.drop_undefined_vars());
                for event in &trap.events {
                    println!("  - {} {}", event.oid, event.name);
                }
            }
            if let Some(entry) = registry.variable(&oid) {
                found = true;
                println!("Variable {} ({})", entry.name, entry.oid);
                println!("  trap: {} ({})", entry.trap_name, entry.trap_oid);
                if !entry.tag.is_empty() {
                    println!("  tag: {}", entry.tag);
                }
                if !entry.conversion.is_empty() {
                    println!("  conversion: {}", entry.conversion);
                }
                let mut values: Vec<_> = entry.enum_reverse.iter().collect();
                values.sort();
                for (value, label) in values {
                    println!("  {} = {}", label, value);
                }
            }
            if !found {
                println!("No trap or variable registered at {}", oid);
            }
        }
        None => {
            println!("Traps: {}", registry.trap_count());
            println!("Variables: {}", registry.variable_count());
            if failures > 0 {
                println!("Failed descriptors: {}", failures);
            }
        }
    }

    Ok(())
}

fn cmd_config(config_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path)?;
            let text = toml::to_string_pretty(&config)?;
            println!("{}", text);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
            println!("  Filter rules: {}", config.filter.rules.len());
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| NetmetaError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            let config = Config::default();
            config.save(&path)?;

            println!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if !path.exists() {
        tracing::warn!(
            "Config file not found, using defaults. Run 'netmeta config init' to create one."
        );
        return Ok(Config::default());
    }

    Config::load(&path)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| NetmetaError::Io {
        source: e,
        context: format!("Failed to read {:?}", path),
    })?;
    serde_json::from_str(&content).map_err(|e| NetmetaError::Json {
        source: e,
        context: format!("Failed to parse {:?}", path),
    })
}
