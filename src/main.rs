use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use redraft::assist::openrouter::OpenRouterAssistClient;
use redraft::assist::AssistService;
use redraft::editor::Editor;
use redraft::extract::extract_text;
use redraft::mode::EditorMode;
use redraft::orchestrator::{
    run_action, run_voice, ActionKind, ActionOutcome, Session, NOT_UNDERSTOOD_NOTICE,
};
use redraft::voice::VoiceClip;

const DEFAULT_MODEL: &str = redraft::assist::openrouter::DEFAULT_MODEL;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EditorModeArg {
    /// Strict academic phrasing.
    Academic,
    /// Creative writing phrasing.
    Novel,
    /// Professional phrasing.
    General,
}

impl EditorModeArg {
    fn to_library(self) -> EditorMode {
        match self {
            EditorModeArg::Academic => EditorMode::Academic,
            EditorModeArg::Novel => EditorMode::Novel,
            EditorModeArg::General => EditorMode::General,
        }
    }
}

#[derive(Debug, Args, Clone)]
struct AssistArgs {
    /// Writing persona used to phrase assist prompts.
    #[arg(long, value_enum, default_value_t = EditorModeArg::General)]
    mode: EditorModeArg,

    /// OpenRouter model name.
    #[arg(long, default_value_t = DEFAULT_MODEL.to_string())]
    model: String,
}

#[derive(Debug, Args, Clone)]
struct DocArgs {
    /// Input text file, or '-' for stdin
    #[arg(long, value_name = "PATH")]
    input: PathBuf,

    /// Output file for the result (defaults to stdout)
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Select the first occurrence of this text before running the action.
    #[arg(long, value_name = "TEXT")]
    select: Option<String>,
}

#[derive(Debug, Parser)]
#[command(name = "redraft")]
#[command(about = "AI-assisted writing editor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Continue the document (or the text after the selection) naturally
    Autocomplete {
        #[command(flatten)]
        doc: DocArgs,

        #[command(flatten)]
        assist: AssistArgs,
    },

    /// Rewrite the selection (or the whole document)
    Rewrite {
        #[command(flatten)]
        doc: DocArgs,

        #[command(flatten)]
        assist: AssistArgs,

        /// Natural-language instruction, e.g. "make it funny"
        #[arg(long, value_name = "TEXT")]
        instruction: Option<String>,
    },

    /// Improve grammar, vocabulary, and flow of the selection (or the whole document)
    Improve {
        #[command(flatten)]
        doc: DocArgs,

        #[command(flatten)]
        assist: AssistArgs,
    },

    /// Summarize the selection (or the whole document); the document is not changed
    Summarize {
        #[command(flatten)]
        doc: DocArgs,

        #[command(flatten)]
        assist: AssistArgs,
    },

    /// Score the selection (or the whole document) with critique and improvements
    Rate {
        #[command(flatten)]
        doc: DocArgs,

        #[command(flatten)]
        assist: AssistArgs,
    },

    /// Interpret a spoken command and optionally apply it to the document
    Voice {
        /// Audio clip with the spoken command (.wav or .mp3)
        #[arg(long, value_name = "PATH")]
        audio: PathBuf,

        /// Apply the interpreted command instead of printing it
        #[arg(long)]
        apply: bool,

        #[command(flatten)]
        doc: DocArgs,

        #[command(flatten)]
        assist: AssistArgs,
    },

    /// Extract plain text from a .docx, .pdf, or text file
    Extract {
        /// Input file
        #[arg(long, value_name = "PATH")]
        input: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

fn read_input(path: &PathBuf) -> Result<String> {
    if path.as_os_str() == std::ffi::OsStr::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        return Ok(buf);
    }

    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn write_output(path: &Option<PathBuf>, contents: &str) -> Result<()> {
    match path {
        Some(path) => fs::write(path, contents)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            println!("{contents}");
            Ok(())
        }
    }
}

fn build_session(doc: &DocArgs, assist: &AssistArgs) -> Result<Session> {
    let text = read_input(&doc.input)?;
    let mut editor = Editor::with_text(&text);
    if let Some(select) = &doc.select {
        editor.select_str(select)?;
    }
    Ok(Session::new(editor, assist.mode.to_library()))
}

fn report_outcome(session: &Session, outcome: ActionOutcome, doc: &DocArgs) -> Result<()> {
    match outcome {
        ActionOutcome::Applied => {
            eprintln!(
                "Applied: document is now {} words",
                session.editor().word_count()
            );
            write_output(&doc.output, &session.editor().text())
        }
        ActionOutcome::Summary(summary) => {
            eprintln!("Summary ready ({} words unchanged)", session.editor().word_count());
            write_output(&doc.output, &summary)
        }
        ActionOutcome::Feedback(feedback) => {
            eprintln!("Feedback ready (score {:.1}/10)", feedback.score);
            let json =
                serde_json::to_string_pretty(&feedback).context("failed to serialize feedback")?;
            write_output(&doc.output, &json)
        }
        ActionOutcome::Rejected(notice) => Err(anyhow!(notice)),
        ActionOutcome::ModeChanged(mode) => {
            eprintln!("Mode changed to {mode}; document unchanged");
            write_output(&doc.output, &session.editor().text())
        }
        ActionOutcome::NotUnderstood => {
            eprintln!("{NOT_UNDERSTOOD_NOTICE}");
            Ok(())
        }
    }
}

fn run_assist_command(
    doc: &DocArgs,
    assist: &AssistArgs,
    kind: ActionKind,
    instruction: Option<String>,
) -> Result<()> {
    let mut session = build_session(doc, assist)?;
    let client = OpenRouterAssistClient::from_env()?.with_model(assist.model.clone());

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    let outcome = runtime.block_on(run_action(&mut session, &client, kind, instruction))?;

    report_outcome(&session, outcome, doc)
}

fn run_voice_command(audio: &PathBuf, apply: bool, doc: &DocArgs, assist: &AssistArgs) -> Result<()> {
    let clip = VoiceClip::from_file(audio)?;
    let mut session = build_session(doc, assist)?;
    let client = OpenRouterAssistClient::from_env()?.with_model(assist.model.clone());

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;

    if !apply {
        let command =
            runtime.block_on(client.interpret_voice(&clip, session.mode()))?;
        let json = serde_json::to_string_pretty(&command)
            .context("failed to serialize voice command")?;
        println!("{json}");
        return Ok(());
    }

    let outcome = runtime.block_on(run_voice(&mut session, &client, &clip))?;
    report_outcome(&session, outcome, doc)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Autocomplete { doc, assist } => {
            run_assist_command(&doc, &assist, ActionKind::Autocomplete, None)
        }
        Command::Rewrite {
            doc,
            assist,
            instruction,
        } => run_assist_command(&doc, &assist, ActionKind::Rewrite, instruction),
        Command::Improve { doc, assist } => {
            run_assist_command(&doc, &assist, ActionKind::Improve, None)
        }
        Command::Summarize { doc, assist } => {
            run_assist_command(&doc, &assist, ActionKind::Summarize, None)
        }
        Command::Rate { doc, assist } => run_assist_command(&doc, &assist, ActionKind::Rate, None),
        Command::Voice {
            audio,
            apply,
            doc,
            assist,
        } => run_voice_command(&audio, apply, &doc, &assist),
        Command::Extract { input, output } => {
            let text = extract_text(&input)?;
            eprintln!(
                "Extracted {} words from {}",
                text.split_whitespace().count(),
                input.display()
            );
            write_output(&output, &text)
        }
    }
}
