use std::path::PathBuf;

use anyhow::anyhow;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use t2s_orchestrator::{
    AudioFormat, Prosody, Provider, T2SClient, T2SConfig, TextToSpeechRequest, TextType,
    VoiceGender, VoiceId, VoiceParams,
};

/// Provider-agnostic text-to-speech synthesis
#[derive(Parser, Debug)]
#[command(name = "t2s")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Synthesize text into a destination URL or path
    Synthesize(SynthesizeArgs),

    /// Print the provider and voice that would be used, without synthesizing
    ResolveVoice {
        #[arg(long, default_value = "en-US")]
        language: String,
        #[arg(long, default_value = "male")]
        gender: String,
        #[arg(long)]
        engine: Option<String>,
        /// Destination used to prefer the provider owning its storage
        #[arg(long, default_value = "")]
        destination: String,
        #[arg(long)]
        format: Option<String>,
    },
}

#[derive(Args, Debug)]
struct SynthesizeArgs {
    /// Text to synthesize
    #[arg(long, conflicts_with = "source", required_unless_present = "source")]
    text: Option<String>,

    /// Read the text from an S3/GCS URL, http(s) URL or local path
    #[arg(long)]
    source: Option<String>,

    #[arg(long)]
    destination: String,

    /// aws or gcp; selected automatically when omitted
    #[arg(long)]
    provider: Option<String>,

    #[arg(long)]
    voice_id: Option<String>,
    #[arg(long)]
    engine: Option<String>,
    #[arg(long)]
    language: Option<String>,
    #[arg(long)]
    gender: Option<String>,

    /// mp3, ogg, pcm, json, linear16, mulaw or alaw
    #[arg(long)]
    format: Option<String>,

    #[arg(long, default_value_t = 1.0)]
    rate: f64,
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pitch: f64,
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    volume: f64,
    #[arg(long, default_value_t = 0)]
    sample_rate: u32,

    /// text, ssml or auto
    #[arg(long, default_value = "auto")]
    text_type: String,

    /// Do not append the audio file extension to the destination
    #[arg(long)]
    no_extension: bool,
}

impl SynthesizeArgs {
    fn to_request(&self) -> anyhow::Result<TextToSpeechRequest> {
        let mut request = TextToSpeechRequest::new(self.text.clone().unwrap_or_default())
            .with_text_type(parse_text_type(&self.text_type)?)
            .with_prosody(Prosody {
                speaking_rate: self.rate,
                pitch: self.pitch,
                volume: self.volume,
            })
            .with_sample_rate(self.sample_rate)
            .with_add_file_extension(!self.no_extension);

        if let Some(provider) = &self.provider {
            request = request.with_provider(parse_provider(provider)?);
        }
        if let Some(format) = &self.format {
            request = request.with_output_format(parse_format(format)?);
        }

        if let Some(id) = &self.voice_id {
            let mut voice = VoiceId::new(id);
            voice.engine = self.engine.clone();
            request = request.with_voice_id(voice);
        } else if self.language.is_some() || self.gender.is_some() || self.engine.is_some() {
            let gender = match self.gender.as_deref() {
                Some(gender) => parse_gender(gender)?,
                None => VoiceGender::default(),
            };
            let mut params = VoiceParams::new(self.language.clone().unwrap_or_default(), gender);
            params.engine = self.engine.clone();
            request = request.with_voice_params(params);
        }

        Ok(request)
    }
}

fn parse_provider(value: &str) -> anyhow::Result<Provider> {
    match Provider::from_str_or_default(value) {
        Provider::Unspecified => Err(anyhow!(
            "Unknown provider '{value}'. Supported providers: aws, gcp"
        )),
        provider => Ok(provider),
    }
}

fn parse_format(value: &str) -> anyhow::Result<AudioFormat> {
    match AudioFormat::from_str_or_default(value) {
        AudioFormat::Unspecified if !value.eq_ignore_ascii_case("unspecified") => Err(anyhow!(
            "Unknown format '{value}'. Supported formats: mp3, ogg, pcm, json, linear16, mulaw, alaw"
        )),
        format => Ok(format),
    }
}

fn parse_gender(value: &str) -> anyhow::Result<VoiceGender> {
    match VoiceGender::from_str_or_default(value) {
        VoiceGender::Unspecified if !value.eq_ignore_ascii_case("unspecified") => Err(anyhow!(
            "Unknown gender '{value}'. Supported genders: male, female, neutral, male-child, female-child"
        )),
        gender => Ok(gender),
    }
}

fn parse_text_type(value: &str) -> anyhow::Result<TextType> {
    match TextType::from_str_or_default(value) {
        TextType::Auto if !value.eq_ignore_ascii_case("auto") => Err(anyhow!(
            "Unknown text type '{value}'. Supported text types: text, ssml, auto"
        )),
        text_type => Ok(text_type),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let config = if let Some(config_path) = &cli.config {
        info!(path = %config_path.display(), "Loading configuration");
        T2SConfig::from_file(config_path).map_err(|e| anyhow!(e.to_string()))?
    } else {
        T2SConfig::from_env().map_err(|e| anyhow!(e.to_string()))?
    };

    let client = T2SClient::new(config)?;
    let outcome = run(&client, cli.command).await;

    if let Err(e) = client.shutdown().await {
        warn!(error = %e, "Provider shutdown reported errors");
    }
    outcome
}

async fn run(client: &T2SClient, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Synthesize(args) => {
            let request = args.to_request()?;
            let destination = match &args.source {
                Some(source) => {
                    client
                        .synthesize_from_source(source, &args.destination, request)
                        .await?
                }
                None => client.synthesize_direct(request, &args.destination).await?,
            };
            println!("{destination}");
        }
        Commands::ResolveVoice {
            language,
            gender,
            engine,
            destination,
            format,
        } => {
            let mut params = VoiceParams::new(language, parse_gender(&gender)?);
            params.engine = engine;
            let mut request = TextToSpeechRequest::new("").with_voice_params(params);
            if let Some(format) = format {
                request = request.with_output_format(parse_format(&format)?);
            }

            let candidate = client.resolve_voice(request, &destination).await?;
            match candidate.engine {
                Some(engine) => println!(
                    "{}\t{}\t{}",
                    candidate.provider, candidate.voice_id, engine
                ),
                None => println!("{}\t{}", candidate.provider, candidate.voice_id),
            }
        }
    }
    Ok(())
}
