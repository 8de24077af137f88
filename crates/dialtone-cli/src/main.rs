//! dialtone CLI — random phone numbers, formatted and spoken.
//!
//! ```text
//! dialtone countries
//! dialtone generate --country UK [--count 3] [--speak] [--international] [--json]
//! dialtone voices [--kokoro-url http://localhost:8880]
//! dialtone serve [--port 2004] [--host 127.0.0.1] [--mute]
//! dialtone speak / stop / current [--server http://localhost:2004]
//! ```

use std::error::Error;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::info;

use dialtone_core::controller::{Controller, SpeakOutcome};
use dialtone_core::rules::RuleTable;
use dialtone_core::types::SpeechConfig;
use dialtone_core::voice::SpeechSynthesizer;
use dialtone_core::RuleError;
use dialtone_lib::silent::SilentSynth;
use dialtone_lib::speech::KokoroSynth;

/// dialtone — plausible random phone numbers, formatted per country
#[derive(Parser)]
#[command(name = "dialtone", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct SpeechArgs {
    /// Kokoro TTS server URL
    #[arg(long, env = "DIALTONE_KOKORO_URL", default_value = "http://localhost:8880")]
    kokoro_url: String,
    /// Fallback voice when no voice matches the number's language
    #[arg(long, env = "DIALTONE_VOICE", default_value = "af_heart")]
    voice: String,
    /// Never touch the audio device
    #[arg(long)]
    mute: bool,
}

impl SpeechArgs {
    fn config(&self) -> SpeechConfig {
        SpeechConfig {
            kokoro_url: self.kokoro_url.clone(),
            voice: self.voice.clone(),
            enabled: !self.mute,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// List supported countries
    Countries,
    /// Generate random numbers
    Generate {
        /// Country code (CN, US, UK, JP, DE, AU)
        #[arg(short, long, default_value = "US")]
        country: String,
        /// How many numbers to generate
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,
        /// Read each number aloud
        #[arg(long)]
        speak: bool,
        /// Also print the international form
        #[arg(long)]
        international: bool,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        speech: SpeechArgs,
    },
    /// List voices offered by the speech backend
    Voices {
        #[command(flatten)]
        speech: SpeechArgs,
    },
    /// Start the dialtone HTTP server
    Serve {
        /// Listen port
        #[arg(long, default_value = "2004")]
        port: u16,
        /// Listen host
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[command(flatten)]
        speech: SpeechArgs,
    },
    /// Ask a running server to speak its current number
    Speak {
        #[arg(long, default_value = "http://localhost:2004")]
        server: String,
    },
    /// Stop speech on a running server
    Stop {
        #[arg(long, default_value = "http://localhost:2004")]
        server: String,
    },
    /// Show a running server's current number
    Current {
        #[arg(long, default_value = "http://localhost:2004")]
        server: String,
    },
}

/// Build the speech backend. Kokoro only when audio is enabled.
async fn synthesizer(
    config: SpeechConfig,
) -> (Box<dyn SpeechSynthesizer + Send>, Option<KokoroSynth>) {
    if !config.enabled {
        return (Box::new(SilentSynth), None);
    }
    let kokoro = KokoroSynth::new(config);
    kokoro.refresh_voices().await;
    (Box::new(kokoro.clone()), Some(kokoro))
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dialtone=info,dialtone_lib=info,dialtone_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            match e.downcast_ref::<RuleError>() {
                Some(RuleError::UnknownCountry(_)) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    // Fail fast on a malformed table before doing anything else.
    let table = RuleTable::standard()?;

    match cli.command {
        Command::Countries => {
            println!(
                "{:<4} {:<6} {:>6}  {:<7} {:<16} VOICE HINT",
                "CODE", "PREFIX", "DIGITS", "LANG", "FORMAT"
            );
            for rule in table.iter() {
                println!(
                    "{:<4} {:<6} {:>6}  {:<7} {:<16} {}",
                    rule.code,
                    rule.prefix,
                    rule.digit_count,
                    rule.language,
                    rule.pattern.to_string(),
                    rule.preferred_voice
                );
            }
        }

        Command::Generate {
            country,
            count,
            speak,
            international,
            json,
            speech,
        } => {
            let config = SpeechConfig {
                enabled: speak && !speech.mute,
                ..speech.config()
            };
            let (synth, kokoro) = synthesizer(config).await;
            let mut controller = Controller::new(table, synth);

            for _ in 0..count {
                let number = controller.generate(&country)?;
                if json {
                    println!("{}", serde_json::to_string(number)?);
                } else if international {
                    println!("{}\t{}", number.display, number.international());
                } else {
                    println!("{}", number.display);
                }

                if speak {
                    if let SpeakOutcome::Dispatched { voice } = controller.speak() {
                        let voice = voice.as_deref().unwrap_or("engine default");
                        info!("speaking with {voice}");
                    }
                    if let Some(kokoro) = &kokoro {
                        kokoro.wait_idle().await;
                    }
                }
            }
        }

        Command::Voices { speech } => {
            let (synth, _kokoro) = synthesizer(speech.config()).await;
            for voice in synth.voices() {
                println!("{:<16} {}", voice.name, voice.language);
            }
        }

        Command::Serve { port, host, speech } => {
            let (synth, _kokoro) = synthesizer(speech.config()).await;
            let app = dialtone_lib::server::router(Controller::new(table, synth));

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!("dialtone listening on {addr}");
            axum::serve(listener, app).await?;
        }

        Command::Speak { server } => post_simple(&server, "speak").await?,
        Command::Stop { server } => post_simple(&server, "stop").await?,

        Command::Current { server } => {
            let resp = reqwest::Client::new()
                .get(format!("{server}/current"))
                .send()
                .await?;
            println!("{}", resp.text().await.unwrap_or_default());
        }
    }

    Ok(())
}

async fn post_simple(server: &str, endpoint: &str) -> Result<(), reqwest::Error> {
    let resp = reqwest::Client::new()
        .post(format!("{server}/{endpoint}"))
        .send()
        .await?;
    println!("{}", resp.text().await.unwrap_or_default());
    Ok(())
}
