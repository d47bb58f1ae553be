//! Replay a media access negotiation off-device.
//!
//! ```text
//! negotiate --sdk 34 --rationale images --grant images --grant video --pick content://media/1
//! ```

use anyhow::Result;
use clap::{Parser, ValueEnum};
use mediagate::core::capability::{Capability, GrantResults};
use mediagate::core::config::{parse_config, GalleryConfig};
use mediagate::core::host::{ImageLoadError, MediaUri, PromptKind};
use mediagate::core::logging::init_logger;
use mediagate::core::screen::{GalleryEvent, GalleryScreen, Step};
use mediagate::core::simulate::{HostCall, ScriptedHost};
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum Cap {
    Storage,
    Images,
    Video,
}

impl From<Cap> for Capability {
    fn from(value: Cap) -> Self {
        match value {
            Cap::Storage => Capability::LegacyStorageRead,
            Cap::Images => Capability::ReadImages,
            Cap::Video => Capability::ReadVideo,
        }
    }
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Platform SDK level the screen runs on
    #[arg(long, default_value_t = 34)]
    sdk: i32,

    #[arg(long)]
    config: Option<PathBuf>,

    /// Capabilities granted before the user taps the gallery button
    #[arg(long, value_enum)]
    granted: Vec<Cap>,

    /// Capabilities the platform would re-prompt for
    #[arg(long, value_enum)]
    rationale: Vec<Cap>,

    /// Capabilities the user allows in the system prompt
    #[arg(long, value_enum)]
    grant: Vec<Cap>,

    /// Capabilities still eligible for a re-prompt after the user denies
    #[arg(long, value_enum)]
    rationale_after_denial: Vec<Cap>,

    /// Dismiss the "permission required" prompt instead of confirming it
    #[arg(long)]
    cancel_rationale: bool,

    /// Follow the "go to settings" prompt
    #[arg(long)]
    open_settings: bool,

    /// Uri the user picks; the picker is backed out of when absent
    #[arg(long)]
    pick: Option<String>,

    /// Make displaying the picked image fail with this message
    #[arg(long)]
    display_error: Option<String>,

    #[arg(long, default_value_t = 12)]
    max_steps: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => parse_config(path),
        None => GalleryConfig::default(),
    };
    init_logger(&config);

    let mut host = ScriptedHost::new(
        args.granted.iter().copied().map(Capability::from),
        args.rationale.iter().copied().map(Capability::from),
    );
    host.display_error = args.display_error.clone().map(ImageLoadError::Platform);

    let mut screen = GalleryScreen::new(host, config, args.sdk);
    println!("model: {:?}", screen.controller().model());

    let mut event = Some(GalleryEvent::GalleryRequested);
    let mut seen = 0;
    for _ in 0..args.max_steps {
        let Some(current) = event.take() else {
            break;
        };
        println!("event: {:?}", current);
        if let GalleryEvent::GrantResult(results) = &current {
            apply_user_choice(&args, screen.host_mut(), results);
        }
        let step = screen.handle(current);
        println!("  step: {:?}", step);

        let calls = screen.host().calls();
        for call in &calls[seen..] {
            println!("  host: {:?}", call);
        }
        seen = calls.len();

        if !matches!(step, Step::Dispatched(_)) {
            break;
        }
        event = calls.last().and_then(|call| respond(&args, call));
    }

    if event.is_some() {
        anyhow::bail!("negotiation did not settle within {} steps", args.max_steps);
    }
    Ok(())
}

/// The platform remembers what the user just decided.
fn apply_user_choice(args: &Args, host: &mut ScriptedHost, results: &GrantResults) {
    for capability in [
        Capability::LegacyStorageRead,
        Capability::ReadImages,
        Capability::ReadVideo,
    ] {
        if results.is_granted(capability) {
            host.granted.insert(capability);
        }
    }
    host.rationale = args
        .rationale_after_denial
        .iter()
        .copied()
        .map(Capability::from)
        .collect();
}

/// What the scripted user does in answer to the last host call.
fn respond(args: &Args, call: &HostCall) -> Option<GalleryEvent> {
    match call {
        HostCall::Modal(prompt) => Some(GalleryEvent::ModalAnswered {
            kind: prompt.kind,
            confirmed: match prompt.kind {
                PromptKind::Rationale => !args.cancel_rationale,
                PromptKind::SettingsRedirect => args.open_settings,
            },
        }),
        HostCall::GrantRequest(capabilities) => {
            let granted: Vec<Capability> =
                args.grant.iter().copied().map(Capability::from).collect();
            let results: GrantResults = capabilities
                .iter()
                .map(|it| (*it, granted.contains(it)))
                .collect();
            Some(GalleryEvent::GrantResult(results))
        }
        HostCall::Picker(_) => Some(GalleryEvent::PickerResult(
            args.pick.clone().map(MediaUri),
        )),
        _ => None,
    }
}
