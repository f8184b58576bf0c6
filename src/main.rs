use std::path::PathBuf;
use std::sync::Arc;

use actor_picker::catalog::Scale;
use actor_picker::config::PickerSettings;
use actor_picker::networking::{HttpCollaborator, LoginForm};
use actor_picker::request::{AnimatedFormat, OutputFormat, OutputMode};
use actor_picker::utils::logging::{init_logging, log_system_info};
use actor_picker::{PickerController, PickerError};
use anyhow::{bail, Context as _};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "actor-picker", version)]
struct Cli {
    /// Settings file layered over the platform default.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Password for deployments that require a login.
    #[arg(long, global = true, env = "PICKER_PASSWORD")]
    password: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List actors grouped by category.
    List,
    /// Show the colour controls applicable to a selection.
    Palette(SelectionArgs),
    /// Print the render URL for a selection.
    Url(SelectionArgs),
    /// Download a render.
    Render(RenderArgs),
}

#[derive(Args, Debug)]
struct SelectionArgs {
    /// Actor slug; defaults to the configured startup actor.
    #[arg(long)]
    actor: Option<String>,

    /// Extra skins layered over the actor's defaults.
    #[arg(long = "skin")]
    skins: Vec<String>,

    /// Default skins to drop.
    #[arg(long = "remove-skin")]
    remove_skins: Vec<String>,

    #[arg(long)]
    animation: Option<String>,

    /// Scale factor or size preset such as `discord128x128`.
    #[arg(long)]
    scale: Option<Scale>,

    /// Colour override as `key=value`.
    #[arg(long = "colour")]
    colours: Vec<String>,

    /// Output format for animated renders.
    #[arg(long, default_value_t = OutputFormat::Apng)]
    format: OutputFormat,

    /// Render a single still frame at this timestamp (seconds).
    #[arg(long)]
    frame_at: Option<f64>,

    /// Small still preview of the head.
    #[arg(long, default_value_t = false)]
    head_preview: bool,

    #[arg(long, default_value_t = false)]
    only_head: bool,

    #[arg(long, default_value_t = false)]
    petpet: bool,

    #[arg(long, default_value_t = false)]
    flip: bool,

    #[arg(long)]
    top_text: Option<String>,

    #[arg(long)]
    top_text_size: Option<u32>,

    #[arg(long)]
    bottom_text: Option<String>,

    #[arg(long)]
    bottom_text_size: Option<u32>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    selection: SelectionArgs,

    /// Output path; defaults to the service's suggested file name.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = PickerSettings::load(cli.config.as_deref()).context("load settings")?;
    init_logging(&settings.logging);
    log_system_info();

    let collaborator = Arc::new(HttpCollaborator::new(&settings.server)?);
    let (controller, _events) = PickerController::new(collaborator, settings);

    start(&controller, cli.password.as_deref()).await?;

    match cli.cmd {
        Command::List => cmd_list(&controller).await,
        Command::Palette(args) => cmd_palette(&controller, args).await,
        Command::Url(args) => cmd_url(&controller, args).await,
        Command::Render(args) => cmd_render(&controller, args).await,
    }
}

/// Run startup, logging in first if the deployment demands it. One full
/// reload is attempted after a collaborator failure.
async fn start(controller: &PickerController, password: Option<&str>) -> anyhow::Result<()> {
    let started = match controller.startup().await {
        Err(e) if e.needs_reload() => {
            warn!("Startup failed ({}), reloading once", e);
            controller.reload().await?
        }
        other => other?,
    };
    if started {
        return Ok(());
    }

    let Some(password) = password else {
        bail!("the rendering service requires a login; pass --password or set PICKER_PASSWORD");
    };
    let mut form = LoginForm::with_password(password);
    match controller.login(&mut form).await {
        Ok(_) => Ok(()),
        Err(PickerError::Network(_)) if form.error.is_some() => {
            bail!("login failed: {}", form.error.unwrap_or_default())
        }
        Err(e) => Err(e.into()),
    }
}

async fn cmd_list(controller: &PickerController) -> anyhow::Result<()> {
    for group in controller.grouped_actors().await {
        println!("{}", group.category);
        for actor in group.actors {
            println!("  {:<24} {}", actor.slug, actor.name);
        }
    }
    Ok(())
}

async fn cmd_palette(controller: &PickerController, args: SelectionArgs) -> anyhow::Result<()> {
    apply_selection(controller, &args).await?;
    for set in controller.palette().await {
        let scope = if set.applicable_skins.is_empty() {
            "all skins".to_string()
        } else {
            set.applicable_skins.iter().cloned().collect::<Vec<_>>().join(", ")
        };
        println!("[{}]", scope);
        for control in &set.controls {
            println!("  {} = {}", control.key, control.default_value);
        }
    }
    Ok(())
}

async fn cmd_url(controller: &PickerController, args: SelectionArgs) -> anyhow::Result<()> {
    let mode = apply_selection(controller, &args).await?;
    let request = controller
        .render_request(mode)
        .await
        .context("selection has nothing to render")?;
    let base = url::Url::parse(&controller.settings().server.base_url)?;
    println!("{}", base.join(request.path_and_query().trim_start_matches('/'))?);
    Ok(())
}

async fn cmd_render(controller: &PickerController, args: RenderArgs) -> anyhow::Result<()> {
    let mode = apply_selection(controller, &args.selection).await?;
    let output = controller.fetch_render(mode, true).await?;
    let path = args.out.unwrap_or_else(|| PathBuf::from(&output.filename));

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    tokio::fs::write(&path, &output.data)
        .await
        .with_context(|| format!("write render '{}'", path.display()))?;

    eprintln!("wrote {} ({} bytes, {})", path.display(), output.data.len(), output.format.mime_type());
    Ok(())
}

/// Apply command-line choices to the selection and pick the output mode
async fn apply_selection(controller: &PickerController, args: &SelectionArgs) -> anyhow::Result<OutputMode> {
    if let Some(slug) = &args.actor {
        controller.select_actor(slug).await?;
    }
    if controller.selection().await.is_none() {
        bail!("no actor is loaded");
    }

    for skin in &args.skins {
        if !controller.add_skin(skin).await {
            warn!("Skin {} not available, ignored", skin);
        }
    }
    for skin in &args.remove_skins {
        if !controller.remove_skin(skin).await {
            warn!("Cannot remove skin {}", skin);
        }
    }
    if let Some(animation) = &args.animation {
        if !controller.set_animation(animation).await {
            bail!("unknown animation {}", animation);
        }
    }
    if let Some(scale) = args.scale {
        if !controller.set_scale(scale).await {
            bail!("invalid scale {:?}", scale);
        }
    }
    for colour in &args.colours {
        let Some((key, value)) = colour.split_once('=') else {
            bail!("colour override {:?} must look like key=value", colour);
        };
        if !controller.set_colour(key, value).await {
            warn!("Colour control {} not applicable to the current skins, ignored", key);
        }
    }

    controller
        .update(|sel| {
            sel.set_only_head(args.only_head);
            sel.set_petpet(args.petpet);
            sel.set_flip(args.flip);
            if let Some(text) = &args.top_text {
                sel.set_top_text(text.clone());
            }
            if let Some(size) = args.top_text_size {
                sel.set_top_text_size(size);
            }
            if let Some(text) = &args.bottom_text {
                sel.set_bottom_text(text.clone());
            }
            if let Some(size) = args.bottom_text_size {
                sel.set_bottom_text_size(size);
            }
            if let Some(at) = args.frame_at {
                sel.set_single_frame(true);
                sel.set_single_frame_timestamp(at);
            }
        })
        .await;

    let mode = if args.head_preview {
        OutputMode::HeadPreview
    } else if args.frame_at.is_some() {
        OutputMode::SingleFrame
    } else {
        match AnimatedFormat::try_from(args.format) {
            Ok(format) => OutputMode::Animated(format),
            Err(_) => OutputMode::SingleFrame,
        }
    };
    info!("Output mode: {:?}", mode);
    Ok(mode)
}
