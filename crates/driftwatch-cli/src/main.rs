use clap::{Args, Parser, Subcommand};
use colored::{ColoredString, Colorize};
use driftwatch_assistant::{AssistantError, AssistantSettings, ChatController, MockResponder};
use driftwatch_config::{Config, ConfigManager, StorageType};
use driftwatch_observability::LogManager;
use driftwatch_session::{
    export_session, format_time_ago, ChatMessage, ChatSession, ChatStorage, ChatStore,
    DateFilter, FileSlotStorage, HistoryFilter, MemorySlotStorage, MessageKind, SessionStats,
    SlotStorage,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

#[derive(Parser)]
#[command(name = "driftwatch")]
#[command(about = "Terraform drift assistant chat history")]
#[command(version)]
struct Cli {
    /// Chat session to operate on (defaults to the most recent one)
    #[arg(long, global = true)]
    session: Option<String>,

    /// Enable debug mode
    #[arg(long, short, global = true, default_value = "false")]
    debug: bool,

    /// Config file path
    #[arg(
        long,
        global = true,
        env = "DRIFTWATCH_CONFIG",
        default_value = "~/.driftwatch/config.json"
    )]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 列出所有会话
    List,
    /// 显示会话消息
    Show,
    /// 创建新会话
    New {
        /// 会话标题
        title: Option<String>,
    },
    /// 发送单条消息
    Send {
        /// 消息内容
        message: String,
    },
    /// 删除会话
    Delete {
        /// 会话 ID
        id: String,
    },
    /// 上传 Terraform 文件
    Upload {
        /// 文件名
        #[arg(required = true)]
        files: Vec<String>,
    },
    /// 连接 AWS 账户
    Connect,
    /// 浏览聊天历史
    History(HistoryArgs),
    /// 导出会话为 JSON 文件
    Export {
        /// 输出目录
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// 显示会话统计
    Stats,
    /// 启动交互式聊天
    Chat,
    /// 配置管理命令
    Config(ConfigArgs),
}

#[derive(Args, Clone)]
struct HistoryArgs {
    /// 按标题或消息内容搜索
    #[arg(long, short)]
    search: Option<String>,

    /// 时间范围 (all, today, week, month)
    #[arg(long, default_value = "all")]
    date: DateFilter,

    /// 消息类型 (user, ai, system)
    #[arg(long)]
    kind: Option<MessageKind>,
}

#[derive(Args, Clone)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// 获取配置值
    Get {
        /// 配置键 (如: storage.path, assistant.region)
        key: String,
    },
    /// 设置配置值
    Set {
        /// 配置键 (如: storage.path, assistant.region)
        key: String,
        /// 配置值
        value: String,
    },
    /// 初始化默认配置
    Init {
        /// 强制覆盖已有配置
        #[arg(long, default_value = "false")]
        force: bool,
    },
    /// 显示当前配置
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    if cli.debug {
        eprintln!("{}", "[DEBUG] Debug mode enabled".dimmed());
    }

    // 展开配置文件路径
    let config_path =
        driftwatch_config::expand_tilde(&cli.config).unwrap_or_else(|| PathBuf::from(&cli.config));

    match cli.command {
        Commands::Config(args) => {
            let _log = init_logging(driftwatch_observability::Config::from_env(), cli.debug)?;
            handle_config(args, &config_path, cli.debug).await
        }
        command => {
            let manager = ConfigManager::load(&config_path).await?;
            let config = manager.snapshot().await;
            let _log = init_logging(driftwatch_observability::Config::from(&config), cli.debug)?;

            if cli.debug {
                eprintln!("{}", format!("[DEBUG] Config path: {:?}", config_path).dimmed());
                eprintln!(
                    "{}",
                    format!(
                        "[DEBUG] Storage: {} at {} (slot {})",
                        config.storage.storage_type, config.storage.path, config.storage.slot_key
                    )
                    .dimmed()
                );
            }

            let mut controller = open_controller(&config, cli.session.as_deref()).await?;
            let span = driftwatch_observability::create_command_span(command.name());

            let result = run_command(command, &mut controller, cli.session.is_some(), cli.debug)
                .instrument(span)
                .await;
            match result {
                Err(e) => report(e),
                Ok(()) => Ok(ExitCode::SUCCESS),
            }
        }
    }
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::List => "list",
            Commands::Show => "show",
            Commands::New { .. } => "new",
            Commands::Send { .. } => "send",
            Commands::Delete { .. } => "delete",
            Commands::Upload { .. } => "upload",
            Commands::Connect => "connect",
            Commands::History(_) => "history",
            Commands::Export { .. } => "export",
            Commands::Stats => "stats",
            Commands::Chat => "chat",
            Commands::Config(_) => "config",
        }
    }
}

fn init_logging(
    config: driftwatch_observability::Config,
    debug: bool,
) -> anyhow::Result<LogManager> {
    let config = if debug {
        config.with_log_level("debug")
    } else {
        config
    };
    Ok(driftwatch_observability::init(&config)?)
}

async fn open_controller(config: &Config, session: Option<&str>) -> anyhow::Result<ChatController> {
    let slots: Arc<dyn SlotStorage> = match config.storage.storage_type {
        StorageType::File => Arc::new(FileSlotStorage::new(&config.storage.path).await?),
        StorageType::Memory => Arc::new(MemorySlotStorage::new()),
    };
    let store =
        ChatStore::open(ChatStorage::with_key(slots, config.storage.slot_key.as_str())).await;

    let settings = AssistantSettings::from_config(config);
    let responder = Arc::new(MockResponder::new(settings.region.as_str()));
    let mut controller = ChatController::open(store, responder, settings).await;

    if let Some(id) = session {
        controller.switch_to(id)?;
    }

    Ok(controller)
}

/// 用户可见的拒绝以非零状态退出，其余错误向上传递
///
/// 返回而不是直接退出进程，日志 guard 才能在 drop 时刷新文件日志。
fn report(err: AssistantError) -> anyhow::Result<ExitCode> {
    if err.is_rejection() {
        println!("{}", format!("❌ {}", err).red());
        return Ok(ExitCode::FAILURE);
    }
    Err(err.into())
}

async fn run_command(
    command: Commands,
    controller: &mut ChatController,
    session_selected: bool,
    debug: bool,
) -> Result<(), AssistantError> {
    match command {
        Commands::List => list_sessions(controller),
        Commands::Show => {
            let session = controller.current_session()?;
            print_session(session, session.messages().iter());
        }
        Commands::New { title } => {
            let session = controller.new_chat(title).await;
            println!(
                "{}",
                format!("✅ Started \"{}\" ({})", session.title(), session.id()).green()
            );
        }
        Commands::Send { message } => send_message(controller, &message, debug).await?,
        Commands::Delete { id } => {
            let removed = controller.delete_chat(&id).await?;
            println!(
                "{}",
                format!("🗑️  \"{}\" has been removed from history", removed.title()).green()
            );
            println!(
                "{}",
                format!("Current chat: {}", controller.current_session_id()).dimmed()
            );
        }
        Commands::Upload { files } => upload_files(controller, files).await?,
        Commands::Connect => connect_aws(controller).await?,
        Commands::History(args) => show_history(controller, args, session_selected)?,
        Commands::Export { output } => export_current(controller, output).await?,
        Commands::Stats => show_stats(controller)?,
        Commands::Chat => run_interactive_chat(controller, debug).await?,
        // 在打开存储之前已处理
        Commands::Config(_) => {}
    }

    Ok(())
}

fn kind_label(kind: MessageKind) -> ColoredString {
    match kind {
        MessageKind::User => "You".cyan().bold(),
        MessageKind::Assistant => "Assistant".green().bold(),
        MessageKind::System => "System".yellow().bold(),
    }
}

fn print_message(message: &ChatMessage) {
    println!(
        "{} {}",
        kind_label(message.kind),
        message.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed()
    );
    println!("{}", message.content);

    if let Some(ref metadata) = message.metadata {
        let mut tags = Vec::new();
        if let Some(ref region) = metadata.region {
            tags.push(region.clone());
        }
        if let Some(count) = metadata.resource_count {
            tags.push(format!("{} resources", count));
        }
        if let Some(ref action) = metadata.action {
            tags.push(action.clone());
        }
        if !tags.is_empty() {
            println!("{}", format!("[{}]", tags.join(" · ")).dimmed());
        }
    }
    println!();
}

fn print_session<'a>(session: &ChatSession, messages: impl Iterator<Item = &'a ChatMessage>) {
    println!(
        "{}",
        format!("💬 {} ({})", session.title(), session.id()).cyan().bold()
    );
    println!("{}", "─".repeat(50).dimmed());
    for message in messages {
        print_message(message);
    }
}

fn list_sessions(controller: &ChatController) {
    let now = chrono::Utc::now();
    println!("{}", "📚 Chat History".cyan().bold());
    println!();

    for session in controller.sessions() {
        let marker = if session.id() == controller.current_session_id() {
            "▶".green()
        } else {
            " ".normal()
        };
        println!(
            "{} {} {} {}",
            marker,
            session.title().bold(),
            format!("({})", session.id()).dimmed(),
            format_time_ago(session.last_activity_at(), now).dimmed()
        );
        println!(
            "    {} {}",
            format!("{} messages", session.message_count()).dimmed(),
            session.preview().unwrap_or_default()
        );
    }
}

async fn send_message(
    controller: &mut ChatController,
    message: &str,
    debug: bool,
) -> Result<(), AssistantError> {
    println!("{}", format!("🚀 Sending message: {}", message).cyan());
    println!("{}", "Assistant is typing...".dimmed());

    let start = Instant::now();
    let exchange = controller.send_message(message).await?;

    if debug {
        eprintln!(
            "{}",
            format!("[DEBUG] Reply {} in {:?}", exchange.reply.id, start.elapsed()).dimmed()
        );
    }

    print_message(&exchange.reply);
    Ok(())
}

async fn upload_files(
    controller: &mut ChatController,
    files: Vec<String>,
) -> Result<(), AssistantError> {
    // 只检查文件名，不读取内容
    let names: Vec<String> = files
        .iter()
        .map(|f| {
            Path::new(f)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| f.clone())
        })
        .collect();

    let outcome = controller.upload_files(names).await?;

    println!("{}", outcome.message.content.green());
    println!(
        "{}",
        format!("{} Terraform files ready for analysis", outcome.accepted.len()).dimmed()
    );
    if !outcome.rejected.is_empty() {
        println!(
            "{}",
            format!("⚠️  Skipped unsupported files: {}", outcome.rejected.join(", ")).yellow()
        );
    }
    Ok(())
}

async fn connect_aws(controller: &mut ChatController) -> Result<(), AssistantError> {
    println!("{}", "🔌 Connecting to AWS...".cyan());
    let message = controller.connect_aws().await?;
    println!("{}", message.content.green());
    Ok(())
}

fn show_history(
    controller: &ChatController,
    args: HistoryArgs,
    session_selected: bool,
) -> Result<(), AssistantError> {
    let mut filter = HistoryFilter::new().with_date(args.date);
    if let Some(search) = args.search {
        filter = filter.with_search(search);
    }
    if let Some(kind) = args.kind {
        filter = filter.with_kind(kind);
    }

    // 指定会话时过滤该会话的消息，否则过滤会话列表
    if session_selected {
        let session = controller.current_session()?;
        let messages = filter.filter_messages(session);
        if messages.is_empty() {
            println!("{}", "No messages match the current filters".dimmed());
            return Ok(());
        }
        print_session(session, messages.into_iter());
        return Ok(());
    }

    let now = chrono::Utc::now();
    let sessions = filter.filter_sessions(controller.sessions(), now);
    if sessions.is_empty() {
        println!("{}", "No chat history found".dimmed());
        return Ok(());
    }

    for session in sessions {
        let stats = SessionStats::of(session);
        println!(
            "{} {} {}",
            session.title().bold(),
            format!("({})", session.id()).dimmed(),
            format_time_ago(session.last_activity_at(), now).dimmed()
        );
        println!(
            "    {}",
            format!(
                "{} messages · {} files · created {}",
                stats.total,
                stats.file_uploads,
                session.created_at().format("%Y-%m-%d")
            )
            .dimmed()
        );
    }
    Ok(())
}

fn show_stats(controller: &ChatController) -> Result<(), AssistantError> {
    let session = controller.current_session()?;
    let stats = SessionStats::of(session);

    println!(
        "{}",
        format!("📊 {} ({})", session.title(), session.id()).cyan().bold()
    );
    println!("Total messages: {}", stats.total);
    println!("  You:          {}", stats.user);
    println!("  Assistant:    {}", stats.assistant);
    println!("  System:       {}", stats.system);
    println!("Files uploaded: {}", stats.file_uploads);
    println!(
        "{}",
        format!("{} sessions in history", controller.sessions().len()).dimmed()
    );
    Ok(())
}

async fn export_current(
    controller: &ChatController,
    output: Option<PathBuf>,
) -> Result<(), AssistantError> {
    let dir = output
        .or_else(|| driftwatch_config::driftwatch_dir().map(|dir| dir.join("exports")))
        .unwrap_or_else(|| PathBuf::from("."));

    let session = controller.current_session()?;
    let path = export_session(session, &dir).await?;
    println!("{}", format!("✅ Exported \"{}\" to {:?}", session.title(), path).green());
    Ok(())
}

async fn run_interactive_chat(
    controller: &mut ChatController,
    debug: bool,
) -> Result<(), AssistantError> {
    println!("{}", "🤖 Driftwatch AI Assistant".cyan().bold());
    println!(
        "{}",
        format!("Session: {}", controller.current_session_id()).dimmed()
    );
    println!(
        "{}",
        "Type 'exit' or 'quit' to leave, '/new [title]', '/upload <files>', '/connect' for actions"
            .dimmed()
    );
    println!();

    loop {
        print!("{} ", "You:".cyan().bold());
        io::stdout()
            .flush()
            .map_err(driftwatch_session::StorageError::from)?;

        let mut input = String::new();
        let read = io::stdin()
            .read_line(&mut input)
            .map_err(driftwatch_session::StorageError::from)?;
        let input = input.trim();

        if read == 0 || input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            println!("{}", "👋 Goodbye!".cyan());
            break;
        }

        if input.is_empty() {
            continue;
        }

        let result = match input.split_once(' ').unwrap_or((input, "")) {
            ("/new", title) => {
                let title = Some(title.trim().to_string()).filter(|t| !t.is_empty());
                let session = controller.new_chat(title).await;
                println!("{}", format!("✅ Started \"{}\"", session.title()).green());
                Ok(())
            }
            ("/upload", files) => {
                upload_files(
                    controller,
                    files.split_whitespace().map(str::to_string).collect(),
                )
                .await
            }
            ("/connect", _) => connect_aws(controller).await,
            _ => match controller.send_message(input).await {
                Ok(exchange) => {
                    print_message(&exchange.reply);
                    Ok(())
                }
                Err(e) => Err(e),
            },
        };

        if let Err(e) = result {
            if debug {
                eprintln!("{}", format!("[DEBUG] Error: {:?}", e).dimmed());
            }
            if !e.is_rejection() {
                return Err(e);
            }
            println!("{}", format!("❌ {}", e).red());
        }
    }

    Ok(())
}

async fn handle_config(
    args: ConfigArgs,
    config_path: &Path,
    debug: bool,
) -> anyhow::Result<ExitCode> {
    if debug {
        eprintln!("{}", format!("[DEBUG] Config path: {:?}", config_path).dimmed());
    }

    match args.command {
        ConfigCommands::Get { key } => {
            let manager = ConfigManager::load(config_path).await?;
            let config = manager.snapshot().await;

            match config.get_value(&key) {
                Some(value) => {
                    println!("{}", format!("{} = {}", key, value).green());
                }
                None => {
                    println!("{}", format!("❌ Key not found: {}", key).red());
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        ConfigCommands::Set { key, value } => {
            let manager = ConfigManager::load(config_path).await?;

            if let Err(e) = manager.update(|config| config.set_value(&key, &value)).await {
                eprintln!("{}", format!("❌ Failed to set value: {}", e).red());
                return Ok(ExitCode::FAILURE);
            }

            println!("{}", format!("✅ Set {} = {}", key, value).green());
        }
        ConfigCommands::Init { force } => {
            if config_path.exists() && !force {
                println!(
                    "{}",
                    format!("⚠️  Config already exists at {:?}", config_path).yellow()
                );
                println!("{}", "Use --force to overwrite".dimmed());
                return Ok(ExitCode::SUCCESS);
            }

            // 初始化目录
            driftwatch_config::init_driftwatch_dirs().await?;

            // 创建默认配置
            let manager = ConfigManager::new(Config::default(), config_path.to_path_buf());
            manager.save().await?;

            println!(
                "{}",
                format!("✅ Config initialized at {:?}", config_path).green()
            );
            println!("{}", "You can edit this file to customize your settings".dimmed());
        }
        ConfigCommands::Show => {
            let manager = ConfigManager::load(config_path).await?;
            let config = manager.snapshot().await;

            println!("{}", "📋 Current Configuration:".cyan().bold());
            println!();

            // 显示为 JSON
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
    }

    Ok(ExitCode::SUCCESS)
}
