//! TTY attachment check (§4.6 `check_tty`). Any operation that prompts
//! a human for a passphrase requires a real terminal on stdin — a
//! heredoc, a pipe, process substitution, or a backgrounded process
//! all fail this check, because none of them can answer a prompt.

use std::io::IsTerminal;

/// `WOW_TEST_MODE` / `SUPERADMIN_MOCK_AUTH` let the test harness bypass
/// the prompt surface entirely (§6 "Environment").
pub fn is_test_mode() -> bool {
    std::env::var_os("WOW_TEST_MODE").is_some() || std::env::var_os("SUPERADMIN_MOCK_AUTH").is_some()
}

pub fn check_tty() -> bool {
    if is_test_mode() {
        return true;
    }
    std::io::stdin().is_terminal()
}
