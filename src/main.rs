//! 命令行入口
//!
//! 标准输入的每一行都被当作新的选区；以 `:` 开头的行是控制命令。
//! 结果输出到标准输出，日志输出到标准错误。

use std::io::Write;
use std::process;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use autotranslate::env::{self, EnvVar};
use autotranslate::translation::config::constants::PENDING_MESSAGE;
use autotranslate::translation::config::{load_translation_config, ConfigManager};
use autotranslate::translation::providers::languages;
use autotranslate::translation::{
    Debouncer, Dispatcher, DispatcherConfig, ProviderRegistry, RequestSettings, ResultSink,
    SessionEvent, SharedSelection, TranslationConfig, TranslationOutcome, TranslationSession,
};

#[derive(Parser, Debug)]
#[command(name = "autotranslate", version, about = "Translate each selection once it settles")]
struct Args {
    /// Language-model generation endpoint
    #[arg(long, value_name = "URL")]
    llm_url: Option<String>,

    /// Translation provider (see --list-providers)
    #[arg(short, long)]
    provider: Option<String>,

    /// Language choice, applied as source or target depending on the provider
    #[arg(short, long)]
    language: Option<String>,

    /// Explicit source language
    #[arg(long)]
    source_lang: Option<String>,

    /// Explicit target language
    #[arg(long)]
    target_lang: Option<String>,

    /// Configuration file (TOML or JSON)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Write an example configuration file and exit
    #[arg(long, value_name = "FILE")]
    generate_config: Option<String>,

    /// List available providers and languages, then exit
    #[arg(long)]
    list_providers: bool,

    /// Print supported environment variables and exit
    #[arg(long)]
    env_docs: bool,
}

/// 把结果写到标准输出
struct StdoutSink {
    out: std::io::Stdout,
}

impl StdoutSink {
    fn new() -> Self {
        Self {
            out: std::io::stdout(),
        }
    }

    fn write_line(&mut self, line: &str) {
        let mut out = self.out.lock();
        if let Err(e) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
            tracing::warn!("写入标准输出失败: {}", e);
        }
    }
}

impl ResultSink for StdoutSink {
    fn show_pending(&mut self, sequence: u64) {
        tracing::trace!("#{} 等待中", sequence);
        self.write_line(PENDING_MESSAGE);
    }

    fn show_result(&mut self, outcome: &TranslationOutcome) {
        self.write_line(&outcome.display_text());
    }
}

fn init_tracing() {
    let level = env::core::LogLevel::get_or_default("info".to_string());
    let no_color = env::core::NoColor::get_or_default(false);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .try_init();
}

fn load_config(args: &Args) -> TranslationConfig {
    let mut config = match &args.config {
        Some(path) => match ConfigManager::from_file(path) {
            Ok(manager) => manager.into_config(),
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
        None => load_translation_config(None),
    };

    if let Some(url) = &args.llm_url {
        config.llm_url = url.clone();
    }
    if let Some(provider) = &args.provider {
        config.provider = provider.clone();
    }
    if let Some(source) = &args.source_lang {
        config.source_lang = Some(source.clone());
    }
    if let Some(target) = &args.target_lang {
        config.target_lang = Some(target.clone());
    }

    config
}

/// 按当前后端的语言角色应用语言选择
fn apply_language(
    registry: &ProviderRegistry,
    settings: RequestSettings,
    language: Option<&str>,
) -> RequestSettings {
    match (registry.info(&settings.provider_id), language) {
        (Some(info), Some(_)) => settings.with_language(info.language_role, language),
        _ => settings,
    }
}

fn print_providers(registry: &ProviderRegistry) {
    println!("Providers:");
    for id in registry.ids() {
        if let Some(info) = registry.info(id) {
            let role = format!("{:?}", info.language_role).to_lowercase();
            let kind = if info.builds_prompt { "prompt" } else { "direct" };
            println!("  {:<12} {} call, language selects {}", id, kind, role);
        }
    }
    println!();
    println!("Languages: {}", languages::supported_languages().join(", "));
}

/// 读取标准输入并转换成会话事件
async fn read_input(
    selection: SharedSelection,
    events: mpsc::UnboundedSender<SessionEvent>,
    registry: Arc<ProviderRegistry>,
    mut settings: RequestSettings,
    mut language: Option<String>,
) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!("读取标准输入失败: {}", e);
                break;
            }
        };

        let event = match line.strip_prefix(':') {
            None => {
                selection.set(&line);
                SessionEvent::SelectionChanged
            }
            Some(command) => {
                let mut parts = command.trim().splitn(2, char::is_whitespace);
                let name = parts.next().unwrap_or_default();
                let argument = parts.next().map(str::trim).filter(|arg| !arg.is_empty());

                match (name, argument) {
                    ("provider", Some(provider)) => {
                        let mut next = RequestSettings::new(provider, &settings.endpoint);
                        next = apply_language(&registry, next, language.as_deref());
                        settings = next;
                        SessionEvent::SettingsChanged(settings.clone())
                    }
                    ("lang", choice) => {
                        language = choice.map(str::to_string);
                        let next = RequestSettings::new(&settings.provider_id, &settings.endpoint);
                        settings = apply_language(&registry, next, language.as_deref());
                        SessionEvent::SettingsChanged(settings.clone())
                    }
                    ("reset", _) => SessionEvent::Reset,
                    ("quit", _) => SessionEvent::Close,
                    _ => {
                        tracing::warn!("未知命令: {}", line);
                        continue;
                    }
                }
            }
        };

        let closing = event == SessionEvent::Close;
        if events.send(event).is_err() || closing {
            break;
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing();

    if args.env_docs {
        print!("{}", env::generate_env_docs());
        return;
    }

    if let Some(path) = &args.generate_config {
        match ConfigManager::generate_example_config(path) {
            Ok(()) => println!("Example configuration written to {}", path),
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    let config = load_config(&args);
    let registry = Arc::new(ProviderRegistry::with_defaults(&config));

    if args.list_providers {
        print_providers(&registry);
        return;
    }

    if !registry.contains(&config.provider) {
        tracing::warn!("未注册的后端 {}，每次翻译都会失败", config.provider);
    }

    let settings = apply_language(&registry, config.request_settings(), args.language.as_deref());
    tracing::info!(
        "后端={}, 源语言={:?}, 目标语言={:?}, 静默期={:?}",
        settings.provider_id,
        settings.source_lang,
        settings.target_lang,
        config.debounce()
    );

    let dispatcher = Dispatcher::new(
        Arc::clone(&registry),
        settings.clone(),
        DispatcherConfig::from(&config),
        StdoutSink::new(),
    );

    let selection = SharedSelection::new();
    let session = TranslationSession::new(
        selection.clone(),
        Debouncer::new(config.debounce()),
        dispatcher,
    );

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    tokio::spawn(read_input(
        selection,
        events_tx,
        registry,
        settings,
        args.language.clone(),
    ));

    let session = session.run(events_rx).await;
    tracing::debug!("统计: {:?}", session.dispatcher().get_stats().snapshot());
}
