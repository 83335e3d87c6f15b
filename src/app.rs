use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use arboard::Clipboard;
use chrono::NaiveDate;
use crossterm::{
    cursor::Show,
    event::{self, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{error, info, warn};
use ratatui::{Terminal, backend::CrosstermBackend};
use tempfile::NamedTempFile;

use crate::logging::{default_log_level, init_logging};
use crate::models::{date_key, parse_date_key, today};
use crate::notes::NoteStore;
use crate::prefs::PreferenceStore;
use crate::screen::{DiaryScreen, ScreenAction};
use crate::storage::{
    Config, configured_base_dir, ensure_dir, entries_dir, load_config, log_dir, prefs_path,
    save_config,
};
use crate::ui::draw;

const CLIPBOARD_LIFETIME_SECS: u64 = 60;
const POLL_MILLIS: u64 = 200;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Options {
    pub date: Option<NaiveDate>,
    pub show: bool,
    pub text_path: Option<PathBuf>,
    pub delete: bool,
    pub dark_mode: Option<bool>,
    pub dir: Option<PathBuf>,
    pub self_check: bool,
    pub version: bool,
    pub help: bool,
}

pub fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Options> {
    let mut opts = Options::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => opts.version = true,
            "--help" | "-h" => opts.help = true,
            "-d" | "--date" => {
                let raw = args
                    .next()
                    .ok_or_else(|| anyhow!("--date requires a YYYY-MM-DD value"))?;
                opts.date = Some(parse_date_key(&raw)?);
            }
            "-t" | "--text" => {
                let path = args.next().ok_or_else(|| anyhow!("--text requires a path"))?;
                opts.text_path = Some(PathBuf::from(path));
            }
            "--dir" => {
                let path = args.next().ok_or_else(|| anyhow!("--dir requires a path"))?;
                opts.dir = Some(PathBuf::from(path));
            }
            "-s" | "--show" => opts.show = true,
            "--delete" => opts.delete = true,
            "--dark" => opts.dark_mode = Some(true),
            "--light" => opts.dark_mode = Some(false),
            "--self-check" => opts.self_check = true,
            other => return Err(anyhow!("Unknown argument: {other}")),
        }
    }
    Ok(opts)
}

pub fn run() -> Result<()> {
    let bin_name = executable_name();
    let opts = parse_args(std::env::args().skip(1))?;

    if opts.help {
        print_usage(&bin_name);
        return Ok(());
    }
    if opts.version {
        println!("{bin_name} v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if let Some(dir) = &opts.dir {
        save_config(dir)?;
        println!("Diary directory set to {}", dir.display());
    }

    let config = load_config()?.unwrap_or_default();
    let base_dir = configured_base_dir(Some(&config))?;
    ensure_dir(&base_dir)?;
    start_logging(&config, &base_dir);

    if opts.self_check {
        #[cfg(debug_assertions)]
        {
            return run_self_check(&base_dir);
        }
        #[cfg(not(debug_assertions))]
        {
            return Err(anyhow!("--self-check is only available in development builds"));
        }
    }

    let notes = NoteStore::open(entries_dir(&base_dir))?;
    let prefs = PreferenceStore::open(prefs_path(&base_dir))?;
    let date = opts.date.unwrap_or_else(today);

    let mut one_shot = opts.dir.is_some();
    if let Some(dark_mode) = opts.dark_mode {
        prefs.set_flag(dark_mode)?;
        println!("Dark mode {}", if dark_mode { "on" } else { "off" });
        one_shot = true;
    }
    if let Some(text_path) = &opts.text_path {
        handle_text_mode(text_path, date, &notes)?;
        one_shot = true;
    }
    if opts.delete {
        if notes.delete(date)? {
            println!("Entry deleted successfully");
        } else {
            println!("No entry to delete for {}", date_key(date));
        }
        one_shot = true;
    }
    if opts.show {
        println!("{}", notes.read(date)?);
        one_shot = true;
    }
    if one_shot {
        return Ok(());
    }

    run_tui(date, &notes, &prefs)
}

fn log_level_for(config: &Config) -> &str {
    config.log_level.as_deref().unwrap_or(default_log_level())
}

fn start_logging(config: &Config, base_dir: &Path) {
    let level = log_level_for(config);
    if let Err(e) = init_logging(level, &log_dir(base_dir)) {
        eprintln!("Logging disabled: {e}");
    }
}

fn handle_text_mode(text_path: &Path, date: NaiveDate, notes: &NoteStore) -> Result<()> {
    let content = fs::read_to_string(text_path)
        .map_err(|e| anyhow!("Failed to read {}: {e}", text_path.display()))?;

    if notes.exists(date) {
        println!("Entry for {} exists. Overwrite? (y/N)", date_key(date));
        let mut ans = String::new();
        io::stdin().read_line(&mut ans)?;
        if !matches!(ans.trim().to_lowercase().as_str(), "y" | "yes") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    notes.write(date, &content)?;
    println!("Stored {} as the entry for {}.", text_path.display(), date_key(date));
    Ok(())
}

fn run_tui(date: NaiveDate, notes: &NoteStore, prefs: &PreferenceStore) -> Result<()> {
    let mut theme = prefs.subscribe();
    let mut screen = DiaryScreen::new(date, today(), *theme.borrow_and_update());
    screen.refresh_marks(notes);
    screen.load(date, notes);
    info!("event=tui_start date={}", date_key(date));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = (|| -> Result<()> {
        loop {
            screen.tick(Instant::now());
            if theme.has_changed().unwrap_or(false) {
                screen.set_dark_mode(*theme.borrow_and_update());
            }

            terminal.draw(|f| draw(f, &screen))?;

            if !event::poll(Duration::from_millis(POLL_MILLIS))? {
                continue;
            }
            let Event::Key(key_event) = event::read()? else {
                continue;
            };
            match screen.handle_key(key_event, notes, prefs) {
                ScreenAction::None => {}
                ScreenAction::Quit => break,
                ScreenAction::OpenEditor(text) => match edit_with_editor(&text, &mut terminal) {
                    Ok(Some(updated)) => {
                        screen.replace_text(&updated);
                        screen.set_status("Entry updated from editor (Ctrl+S to save)");
                    }
                    Ok(None) => screen.set_status("Editor cancelled"),
                    Err(e) => {
                        warn!("event=editor status=error error={e}");
                        screen.set_status(format!("Editor error: {e}"));
                    }
                },
                ScreenAction::CopyToClipboard(text) => match copy_to_clipboard(text) {
                    Ok(()) => screen.set_status(format!(
                        "Copied entry to clipboard for {CLIPBOARD_LIFETIME_SECS}s"
                    )),
                    Err(e) => screen.set_status(format!("Clipboard error: {e}")),
                },
            }
        }
        Ok(())
    })();

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen, Show).ok();
    terminal.show_cursor().ok();

    if let Err(e) = &result {
        error!("event=tui_exit status=error error={e}");
    } else {
        info!("event=tui_exit status=ok");
    }
    result
}

/// Hands the entry to `$EDITOR`. `None` when the editor exits unsuccessfully.
fn edit_with_editor(
    text: &str,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<Option<String>> {
    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen, Show).ok();

    let outcome = (|| -> Result<Option<String>> {
        let mut file = NamedTempFile::new()?;
        file.write_all(text.as_bytes())?;
        file.flush()?;

        let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
        let status = Command::new(&editor)
            .arg(file.path())
            .status()
            .map_err(|e| anyhow!("Failed to launch {editor}: {e}"))?;
        if !status.success() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(file.path())?))
    })();

    execute!(terminal.backend_mut(), EnterAlternateScreen).ok();
    enable_raw_mode().ok();
    terminal.clear()?;
    outcome
}

fn copy_to_clipboard(text: String) -> Result<()> {
    let mut clipboard = Clipboard::new().map_err(|e| anyhow!("Clipboard unavailable: {e}"))?;
    clipboard
        .set_text(text)
        .map_err(|e| anyhow!("Failed to set clipboard: {e}"))?;
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(CLIPBOARD_LIFETIME_SECS));
        let _ = clipboard.set_text(String::new());
    });
    Ok(())
}

#[cfg(debug_assertions)]
fn run_self_check(base_dir: &Path) -> Result<()> {
    let mut failures = 0u32;
    let mut warnings = 0u32;

    println!("Diary directory: {}", base_dir.display());

    #[cfg(unix)]
    {
        let mode = crate::storage::mode_of(base_dir)?;
        if mode == 0o700 {
            println!("[PASS] Diary directory permissions are 0o700");
        } else {
            println!("[WARN] Diary directory permissions are {mode:o}, expected 700");
            warnings += 1;
        }
    }

    match load_config() {
        Ok(Some(_)) => println!("[PASS] Config file is readable"),
        Ok(None) => println!("[PASS] No config file; using defaults"),
        Err(e) => {
            println!("[FAIL] Config file is invalid: {e}");
            failures += 1;
        }
    }

    let prefs_file = prefs_path(base_dir);
    if prefs_file.exists() {
        match fs::read_to_string(&prefs_file)
            .map_err(anyhow::Error::from)
            .and_then(|raw| Ok(serde_json::from_str::<crate::models::Preferences>(&raw)?))
        {
            Ok(prefs) => println!("[PASS] Preferences readable (dark_mode={})", prefs.dark_mode),
            Err(e) => {
                println!("[WARN] Preferences unreadable, defaults will be used: {e}");
                warnings += 1;
            }
        }
    } else {
        println!("[PASS] No preference file yet; dark mode defaults to off");
    }

    let notes = NoteStore::open(entries_dir(base_dir))?;
    match notes.dates() {
        Ok(dates) => {
            let noun = if dates.len() == 1 { "entry" } else { "entries" };
            println!("[PASS] {} {noun} found", dates.len());
            #[cfg(unix)]
            {
                for date in &dates {
                    let mode = crate::storage::mode_of(&notes.path_for(*date))?;
                    if mode != 0o600 {
                        println!(
                            "[WARN] Entry {} has permissions {mode:o}, expected 600",
                            date_key(*date)
                        );
                        warnings += 1;
                    }
                }
            }
            for date in &dates {
                if let Err(e) = notes.read(*date) {
                    println!("[FAIL] Entry {} is unreadable: {e}", date_key(*date));
                    failures += 1;
                }
            }
        }
        Err(e) => {
            println!("[FAIL] Entries directory is unreadable: {e}");
            failures += 1;
        }
    }

    println!("Self-check complete: {failures} failure(s), {warnings} warning(s).");
    if failures > 0 {
        Err(anyhow!("Self-check failed"))
    } else {
        Ok(())
    }
}

fn print_usage(bin_name: &str) {
    eprintln!("Usage: {bin_name} [OPTIONS]");
    eprintln!("  (no options)            Open the diary on today's date");
    eprintln!("  -d, --date <YYYY-MM-DD> Date to open or act on (default: today)");
    eprintln!("  -s, --show              Print the entry for the date");
    eprintln!("  -t, --text <PATH>       Store a text file as the entry for the date");
    eprintln!("      --delete            Delete the entry for the date");
    eprintln!("      --dark | --light    Set the theme preference");
    eprintln!("      --dir <PATH>        Keep the diary in PATH (inside your home directory)");
    #[cfg(debug_assertions)]
    eprintln!("      --self-check        Run integrity checks");
    eprintln!("  -V, --version           Show version and exit");
    eprintln!("  -h, --help              Show this help");
}

fn executable_name() -> String {
    let fallback = "diary".to_string();
    let arg0 = match std::env::args().next() {
        Some(v) => v,
        None => return fallback,
    };
    let path = Path::new(&arg0);
    match path.file_name().and_then(|name| name.to_str()) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_arguments_opens_the_screen() {
        assert_eq!(parse_args(args(&[])).unwrap(), Options::default());
    }

    #[test]
    fn parses_date_and_one_shot_flags() {
        let opts =
            parse_args(args(&["--date", "2025-04-08", "-s", "--delete", "--dark"])).unwrap();
        assert_eq!(opts.date, NaiveDate::from_ymd_opt(2025, 4, 8));
        assert!(opts.show);
        assert!(opts.delete);
        assert_eq!(opts.dark_mode, Some(true));
    }

    #[test]
    fn rejects_bad_date_and_missing_values() {
        assert!(parse_args(args(&["--date", "8/4/2025"])).is_err());
        assert!(parse_args(args(&["--date"])).is_err());
        assert!(parse_args(args(&["--text"])).is_err());
    }

    #[test]
    fn log_level_comes_from_config_or_build_default() {
        let config = Config {
            log_level: Some("warn".into()),
            ..Config::default()
        };
        assert_eq!(log_level_for(&config), "warn");
        assert_eq!(log_level_for(&Config::default()), default_log_level());
    }

    #[test]
    fn rejects_unknown_arguments() {
        let err = parse_args(args(&["--frobnicate"])).unwrap_err();
        assert!(err.to_string().contains("--frobnicate"));
    }

    #[test]
    fn later_theme_flag_wins() {
        let opts = parse_args(args(&["--dark", "--light"])).unwrap();
        assert_eq!(opts.dark_mode, Some(false));
    }
}
