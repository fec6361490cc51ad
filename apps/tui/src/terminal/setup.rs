use color_eyre::eyre::eyre;
use color_eyre::Result;
use crossterm::{
    cursor, execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{stdout, Stdout, Write};

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Runs `restore` before whatever panic hook is currently installed.
///
/// Installed after `color_eyre::install`, so the report is printed to a
/// terminal that has already left raw mode.
pub fn chain_panic_restore<F>(restore: F)
where
    F: Fn() + Send + Sync + 'static,
{
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore();
        previous(info);
    }));
}

/// Set up the terminal: raw mode, alternate screen, hidden cursor
pub fn setup_terminal() -> Result<Tui> {
    let (width, height) = crossterm::terminal::size().unwrap_or((80, 24));
    tracing::debug!(width, height, "Setting up terminal");

    if let Err(e) = enable_raw_mode() {
        return Err(eyre!("Failed to enable raw mode: {e}"));
    }
    // Restore the terminal before any panic report
    chain_panic_restore(|| cleanup_terminal_state(true, true));

    let mut stdout = stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(eyre!("Failed to enter alternate screen: {e}"));
    }

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = match Terminal::new(backend) {
        Ok(term) => term,
        Err(e) => {
            let _ = execute!(std::io::stdout(), LeaveAlternateScreen);
            let _ = disable_raw_mode();
            return Err(eyre!("Failed to create terminal: {e}"));
        }
    };

    // Not fatal, the first draw repaints everything anyway
    if let Err(e) = terminal.clear() {
        tracing::warn!(error = %e, "Failed to clear terminal");
    }
    if let Err(e) = execute!(std::io::stdout(), cursor::Hide) {
        tracing::warn!(error = %e, "Failed to hide cursor");
    }

    tracing::debug!("Terminal setup completed");
    Ok(terminal)
}

/// Restore the terminal, undoing only what was actually changed
pub fn cleanup_terminal_state(raw_mode: bool, alternate_screen: bool) {
    let mut stdout_handle = stdout();

    if let Err(e) = execute!(stdout_handle, cursor::Show) {
        tracing::warn!(error = %e, "Failed to show cursor");
    }

    if alternate_screen {
        if let Err(e) = execute!(stdout_handle, LeaveAlternateScreen) {
            tracing::warn!(error = %e, "Failed to leave alternate screen");
        }
    }

    if raw_mode {
        if let Err(e) = disable_raw_mode() {
            tracing::warn!(error = %e, "Failed to disable raw mode");
        }
    }

    // Force a newline so the prompt appears correctly
    let _ = execute!(stdout_handle, cursor::MoveToNextLine(1));
    let _ = stdout_handle.flush();

    tracing::debug!("Terminal cleanup completed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn panic_restores_before_previous_hook() {
        let restored = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&restored);

        let previous_ran = Arc::new(AtomicBool::new(false));
        let previous_flag = Arc::clone(&previous_ran);
        let order_ok = Arc::new(AtomicBool::new(false));
        let order_flag = Arc::clone(&order_ok);
        let restore_seen = Arc::clone(&restored);

        std::panic::set_hook(Box::new(move |_| {
            order_flag.store(restore_seen.load(Ordering::SeqCst), Ordering::SeqCst);
            previous_flag.store(true, Ordering::SeqCst);
        }));
        chain_panic_restore(move || flag.store(true, Ordering::SeqCst));

        let result = std::panic::catch_unwind(|| panic!("radar blew up"));
        drop(std::panic::take_hook());

        assert!(result.is_err());
        assert!(restored.load(Ordering::SeqCst));
        assert!(previous_ran.load(Ordering::SeqCst));
        assert!(order_ok.load(Ordering::SeqCst));
    }
}
