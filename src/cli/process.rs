use std::{
    env,
    ffi::OsString,
    path::{Path, PathBuf},
    process::Stdio,
};

use anyhow::{anyhow, Result};
use sysinfo::{get_current_pid, Pid, Process, System};
use tracing::{debug, info};

const SERVE_COMMAND: &str = "serve";

/// `workhours-daemon` lives next to the cli executable.
pub fn daemon_executable(cli_executable: &Path) -> PathBuf {
    let mut path = cli_executable.to_path_buf();
    path.set_file_name("workhours-daemon");
    #[cfg(windows)]
    {
        path.set_extension("exe");
    }
    path
}

fn is_serve_command(cmd: &[OsString]) -> bool {
    cmd.iter().skip(1).any(|arg| arg == SERVE_COMMAND)
}

/// Daemons are either `workhours serve` or the separate daemon binary. Other cli invocations
/// (like a running `watch`) are left alone.
fn is_server(process: &Process, cli_executable: &Path) -> bool {
    let Some(exe) = process.exe().filter(|v| v.exists()) else {
        return false;
    };
    (exe == cli_executable && is_serve_command(process.cmd()))
        || exe == daemon_executable(cli_executable)
}

fn servers<'a>(
    system: &'a System,
    cli_executable: &'a Path,
) -> Result<impl Iterator<Item = (&'a Pid, &'a Process)>> {
    let current_id = get_current_pid().map_err(|e| anyhow!("Can't get current pid {e}"))?;
    Ok(system.processes().iter().filter(move |(pid, process)| {
        **pid != current_id
            && !matches!(process.parent(), Some(p) if p == current_id)
            && is_server(process, cli_executable)
    }))
}

pub fn is_server_running(cli_executable: &Path) -> Result<bool> {
    let system = System::new_all();
    let running = servers(&system, cli_executable)?.next().is_some();
    Ok(running)
}

/// Terminates every running daemon, returns how many were found.
pub fn kill_previous_servers(cli_executable: &Path) -> Result<usize> {
    let system = System::new_all();
    let mut killed = 0;
    for (pid, process) in servers(&system, cli_executable)? {
        debug!("Stopping daemon {pid}");
        // This will forcefully terminate the process on Windows. Anything better will require a
        // lot more work.
        if process.kill_with(sysinfo::Signal::Term).is_none() {
            process.kill();
        }
        process.wait();
        killed += 1;
    }
    Ok(killed)
}

pub fn current_executable() -> Result<PathBuf> {
    env::current_exe().map_err(|e| anyhow!("Can't operate without an executable {e}"))
}

/// Intended for shutting down previous server and starting new one. Currently for simplicity sake
/// it operates using a detached process.
pub fn restart_server(dir: &Path) -> Result<()> {
    let process_name = current_executable()?;
    let killed = kill_previous_servers(&process_name)?;
    if killed > 0 {
        info!("Stopped {killed} running daemons");
    }
    let mut command = std::process::Command::new(process_name);
    command.arg("--dir").arg(dir).arg(SERVE_COMMAND);
    command.stdin(Stdio::null());
    command.stdout(Stdio::null());
    command.stderr(Stdio::null());

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const DETACHED_PROCESS: u32 = 0x00000008;
        command.creation_flags(DETACHED_PROCESS);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    #[allow(clippy::zombie_processes)]
    let child = command.spawn()?;
    info!("Spawned daemon {}", child.id());
    Ok(())
}
