//! Interactive query loop.
//!
//! rustyline line editing with persistent history; each line is answered
//! with recommendations followed by the streamed explanation.

use crate::render;
use apirec_memory::VectorIndex;
use apirec_recommender::RecommendationEngine;
use futures::StreamExt;
use rustyline::error::ReadlineError;
use rustyline::highlight::MatchingBracketHighlighter;
use rustyline::hint::HistoryHinter;
use rustyline::{CompletionType, Config, EditMode, Editor};
use rustyline_derive::{Helper, Highlighter, Hinter, Validator};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

/// Words that end the loop.
const EXIT_WORDS: [&str; 2] = ["quit", "exit"];

/// True when the input line ends the session.
pub fn is_exit(line: &str) -> bool {
    let line = line.trim();
    EXIT_WORDS.iter().any(|w| line.eq_ignore_ascii_case(w))
}

#[derive(Helper, Highlighter, Hinter, Validator)]
struct ReplHelper {
    #[rustyline(Hinter)]
    hinter: HistoryHinter,
    #[rustyline(Highlighter)]
    highlighter: MatchingBracketHighlighter,
}

impl rustyline::completion::Completer for ReplHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        let prefix = &line[..pos];
        if prefix.is_empty() {
            return Ok((pos, Vec::new()));
        }
        let matches = EXIT_WORDS
            .iter()
            .filter(|w| w.starts_with(prefix))
            .map(|w| w.to_string())
            .collect();
        Ok((0, matches))
    }
}

/// The interactive loop.
pub struct Repl {
    engine: Arc<RecommendationEngine>,
    top_k: Option<usize>,
    history_file: Option<PathBuf>,
}

impl Repl {
    /// Create a loop over `engine`.
    pub fn new(engine: Arc<RecommendationEngine>, top_k: Option<usize>) -> Self {
        Self {
            engine,
            top_k,
            history_file: apirec_core::paths::history_file().ok(),
        }
    }

    /// Run until quit, exit or Ctrl-D.
    pub async fn run(&self) -> anyhow::Result<()> {
        render::render_welcome(&self.engine.recommender().index().spec().name);

        let rl_config = Config::builder()
            .history_ignore_space(true)
            .completion_type(CompletionType::List)
            .edit_mode(EditMode::Emacs)
            .build();

        let mut rl: Editor<ReplHelper, rustyline::history::FileHistory> =
            Editor::with_config(rl_config)?;
        rl.set_helper(Some(ReplHelper {
            hinter: HistoryHinter::new(),
            highlighter: MatchingBracketHighlighter::new(),
        }));

        if let Some(path) = &self.history_file {
            let _ = rl.load_history(path);
        }

        loop {
            let prompt = console::style("> ").green().bold().to_string();
            // Needs the multi-thread runtime started by `main`.
            let line = tokio::task::block_in_place(|| rl.readline(&prompt));

            match line {
                Ok(line) => {
                    let query = line.trim();
                    if query.is_empty() {
                        continue;
                    }
                    if is_exit(query) {
                        break;
                    }
                    let _ = rl.add_history_entry(query);
                    answer(&self.engine, query, self.top_k).await?;
                }
                Err(ReadlineError::Interrupted) => {
                    eprintln!("{}", console::style("^C (type quit to exit)").dim());
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    eprintln!("{}: {}", console::style("Error").red(), err);
                    break;
                }
            }
        }

        if let Some(path) = &self.history_file {
            let _ = rl.save_history(path);
        }

        eprintln!("{}", console::style("Goodbye!").dim());
        Ok(())
    }
}

/// Answer one query, printing the explanation as it streams.
pub async fn answer(
    engine: &RecommendationEngine,
    query: &str,
    top_k: Option<usize>,
) -> anyhow::Result<()> {
    let (recommendations, mut explanation) = engine.answer_stream(query, top_k).await;
    render::render_recommendations(&recommendations);
    if recommendations.is_empty() {
        return Ok(());
    }

    let mut stdout = std::io::stdout();
    let mut wrote = false;
    while let Some(chunk) = explanation.next().await {
        write!(stdout, "{}", chunk)?;
        stdout.flush()?;
        wrote = true;
    }

    if wrote {
        writeln!(stdout)?;
    } else {
        eprintln!("{}", console::style("(no explanation available)").dim());
    }
    writeln!(stdout)?;
    Ok(())
}
