//! Terminal front-end: command parsing and notice rendering.
//!
//! The UI layer owns the two message enums; the session runner consumes
//! [`SessionCommand`]s and produces [`SessionNotice`]s. Keeping parsing and
//! rendering here means the runner and the state machine never touch
//! presentation strings.
//!
//! # Command language
//!
//! | Input | Effect |
//! |-------|--------|
//! | `cat <id>` | toggle a category |
//! | `gerar [n]` | generate a bulletin, `n` articles per category |
//! | `editar` / `texto <…>` / `cancelar` | edit-mode flow |
//! | `salvar` / `salvar-audio` | save text only / save + regenerate audio |
//! | `play`, `seek <0..1>`, `avancar`, `voltar`, `mudo` | playback |
//! | `copiar`, `baixar` | copy text / download audio |
//! | `status`, `ajuda`, `sair` | housekeeping |

use std::path::PathBuf;

use crate::player::format_time;

// ---------------------------------------------------------------------------
// SessionCommand
// ---------------------------------------------------------------------------

/// Commands sent from the front-end to the session runner.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    /// Flip membership of a category.
    ToggleCategory(String),
    /// Request a new bulletin. `None` means "use the fallback count";
    /// unparsable operator input also arrives as `None` and shares the
    /// fallback.
    Generate { articles_per_category: Option<i64> },
    /// Start editing the displayed text.
    EnterEdit,
    /// Replace the edit buffer.
    UpdateBuffer(String),
    /// Leave edit mode without saving.
    CancelEdit,
    /// Save the buffer as the new text; audio becomes stale.
    SaveTextOnly,
    /// Save the buffer and regenerate audio for it.
    SaveAndRegenerate,
    TogglePlay,
    /// Seek to a normalized position in `[0, 1]`.
    SeekRatio(f64),
    /// Jump forward/backward by seconds.
    Skip(f64),
    ToggleMute,
    /// Copy the displayed text to the clipboard.
    CopyText,
    /// Download the presented audio to the local audio directory.
    DownloadAudio,
    /// Ask for a status snapshot.
    ShowStatus,
}

// ---------------------------------------------------------------------------
// SessionNotice
// ---------------------------------------------------------------------------

/// Status snapshot rendered by the `status` command.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub state_label: &'static str,
    pub selection: Vec<String>,
    pub text_audio_consistent: bool,
    /// Whether an audio control may be presented right now. Derived from
    /// the session's `presented_audio` — never true while inconsistent.
    pub audio_available: bool,
    pub playing: bool,
    pub muted: bool,
    pub position_secs: f64,
    pub duration_secs: f64,
}

/// Notices delivered from the session runner to the front-end.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionNotice {
    SelectionChanged(Vec<String>),
    GenerationStarted,
    BulletinReady { text: String, has_audio: bool },
    EditStarted { buffer: String },
    EditCancelled,
    TextSaved { text: String, audio_hidden: bool },
    RegenerationStarted,
    AudioRefreshed { text: String },
    PlaybackEnded,
    TextCopied,
    AudioDownloaded(PathBuf),
    Status(StatusSnapshot),
    Error(String),
}

// ---------------------------------------------------------------------------
// Input parsing
// ---------------------------------------------------------------------------

/// One parsed line of operator input.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Command(SessionCommand),
    Help,
    Quit,
    Empty,
    Unknown(String),
}

/// Parse a line of operator input.
pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "ajuda" | "help" | "?" => return Input::Help,
        "sair" | "quit" => return Input::Quit,
        "status" => SessionCommand::ShowStatus,
        "cat" | "categoria" if !rest.is_empty() => {
            SessionCommand::ToggleCategory(rest.to_ascii_lowercase())
        }
        "gerar" => SessionCommand::Generate {
            articles_per_category: rest.parse::<i64>().ok(),
        },
        "editar" => SessionCommand::EnterEdit,
        "texto" => SessionCommand::UpdateBuffer(rest.to_string()),
        "cancelar" => SessionCommand::CancelEdit,
        "salvar" => SessionCommand::SaveTextOnly,
        "salvar-audio" => SessionCommand::SaveAndRegenerate,
        "play" | "pausa" => SessionCommand::TogglePlay,
        "seek" => match rest.parse::<f64>() {
            Ok(ratio) => SessionCommand::SeekRatio(ratio),
            Err(_) => return Input::Unknown(line.to_string()),
        },
        "avancar" => SessionCommand::Skip(rest.parse::<f64>().unwrap_or(5.0)),
        "voltar" => SessionCommand::Skip(-rest.parse::<f64>().unwrap_or(5.0)),
        "mudo" => SessionCommand::ToggleMute,
        "copiar" => SessionCommand::CopyText,
        "baixar" => SessionCommand::DownloadAudio,
        _ => return Input::Unknown(line.to_string()),
    };

    Input::Command(command)
}

/// Help text for the `ajuda` command.
pub const HELP: &str = "\
Comandos:
  cat <id>         ativa/desativa uma categoria (geral, politica, economia, tecnologia, esportes)
  gerar [n]        gera um boletim (n artigos por categoria, padrão 3)
  editar           edita o texto exibido
  texto <novo>     substitui o conteúdo do editor
  salvar           salva só o texto (o áudio antigo é ocultado)
  salvar-audio     salva o texto e gera um novo áudio
  cancelar         descarta a edição
  play             toca / pausa o áudio
  seek <0..1>      pula para uma posição proporcional
  avancar [s]      avança s segundos (padrão 5)
  voltar [s]       volta s segundos (padrão 5)
  mudo             liga/desliga o som
  copiar           copia o texto para a área de transferência
  baixar           baixa o áudio apresentado
  status           mostra o estado da sessão
  sair             encerra";

// ---------------------------------------------------------------------------
// Notice rendering
// ---------------------------------------------------------------------------

/// Render a notice as a line (or block) for the terminal.
pub fn render_notice(notice: &SessionNotice) -> String {
    match notice {
        SessionNotice::SelectionChanged(ids) => {
            format!("Categorias ativas: {}", ids.join(", "))
        }
        SessionNotice::GenerationStarted => "Gerando boletim…".into(),
        SessionNotice::BulletinReady { text, has_audio } => {
            let audio_line = if *has_audio {
                "Áudio disponível — use `play`."
            } else {
                "Boletim sem áudio (somente texto)."
            };
            format!("Boletim pronto!\n\n{text}\n\n{audio_line}")
        }
        SessionNotice::EditStarted { buffer } => {
            format!(
                "Editando. Texto atual:\n{buffer}\nUse `texto <novo>` e depois `salvar` ou `salvar-audio`."
            )
        }
        SessionNotice::EditCancelled => "Edição descartada.".into(),
        SessionNotice::TextSaved { text, audio_hidden } => {
            let warning = if *audio_hidden {
                "\nO áudio foi ocultado pois não corresponde mais ao texto novo. Use `salvar-audio` para gerar outro."
            } else {
                ""
            };
            format!("Texto salvo.\n\n{text}{warning}")
        }
        SessionNotice::RegenerationStarted => "Gerando novo áudio…".into(),
        SessionNotice::AudioRefreshed { text } => {
            format!("Texto e áudio atualizados!\n\n{text}")
        }
        SessionNotice::PlaybackEnded => "Fim do áudio.".into(),
        SessionNotice::TextCopied => "Texto copiado para a área de transferência.".into(),
        SessionNotice::AudioDownloaded(path) => {
            format!("Áudio salvo em {}", path.display())
        }
        SessionNotice::Status(s) => {
            let audio = if s.audio_available {
                format!(
                    "áudio {} {} / {}{}",
                    if s.playing { "tocando" } else { "pausado" },
                    format_time(s.position_secs),
                    format_time(s.duration_secs),
                    if s.muted { " (mudo)" } else { "" },
                )
            } else {
                "sem áudio apresentável".into()
            };
            format!(
                "Estado: {} | categorias: {} | texto/áudio consistentes: {} | {}",
                s.state_label,
                s.selection.join(", "),
                if s.text_audio_consistent { "sim" } else { "não" },
                audio,
            )
        }
        SessionNotice::Error(message) => format!("Erro: {message}"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
