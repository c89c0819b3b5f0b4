// Smoke tests of the compiled binary.
//
// The PTY test plays one pick through the real crossterm loop with an
// in-memory progress store. It needs a pseudo terminal (expectrl), so it is
// Unix-only and ignored by default:
// `cargo test --test integration_min_session -- --ignored`.

#![cfg(unix)]

use std::time::Duration;

use expectrl::{spawn, Eof};

#[test]
#[ignore]
fn minimal_session_completes_and_exits() -> Result<(), Box<dyn std::error::Error>> {
    let bin = assert_cmd::cargo::cargo_bin("skewdle");
    let cmd = format!("{} --ephemeral --pack classic", bin.display());

    let mut p = spawn(cmd)?;

    // Give the app a moment to initialize the terminal/alternate screen
    std::thread::sleep(Duration::from_millis(200));

    // Start from the menu, pick the focused claim, then give up
    p.send("\r")?;
    std::thread::sleep(Duration::from_millis(100));
    p.send("\r")?;
    std::thread::sleep(Duration::from_millis(100));
    p.send("\x1b")?; // ESC ends the session
    std::thread::sleep(Duration::from_millis(200));

    // ESC again quits from the game-over screen
    p.send("\x1b")?;

    p.expect(Eof)?;
    Ok(())
}

#[test]
fn refuses_to_run_without_a_tty() {
    assert_cmd::Command::cargo_bin("skewdle")
        .unwrap()
        .arg("--ephemeral")
        .write_stdin("")
        .assert()
        .failure();
}
