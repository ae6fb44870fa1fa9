//! Process finding and module information

/// Information about a running process
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessInfo {
    /// Process ID
    pub pid: u32,
    /// Process name
    pub name: String,
    /// Base address of the main module
    pub base_address: usize,
    /// Size of the main module
    pub module_size: usize,
    /// Whether the process is 64-bit
    pub is_64_bit: bool,
}

impl ProcessInfo {
    /// Process info for a 64-bit process with a known main module
    pub fn new(pid: u32, name: impl Into<String>, base_address: usize, module_size: usize) -> Self {
        Self {
            pid,
            name: name.into(),
            base_address,
            module_size,
            is_64_bit: true,
        }
    }
}

/// Whether a process name matches a target, ignoring case and a trailing `.exe`
pub(crate) fn name_matches(process_name: &str, target: &str) -> bool {
    fn stem(s: &str) -> String {
        let lower = s.to_lowercase();
        lower.strip_suffix(".exe").map(str::to_string).unwrap_or(lower)
    }
    stem(process_name) == stem(target)
}

/// Find a process by name
///
/// Returns process info if found, None otherwise
#[cfg(target_os = "windows")]
pub fn find_process(process_name: &str) -> Option<ProcessInfo> {
    use windows::Win32::Foundation::CloseHandle;
    use windows::Win32::System::Diagnostics::ToolHelp::{
        CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W,
        TH32CS_SNAPPROCESS,
    };

    unsafe {
        let snapshot = CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0).ok()?;

        let mut entry = PROCESSENTRY32W {
            dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
            ..Default::default()
        };

        let mut found = None;
        if Process32FirstW(snapshot, &mut entry).is_ok() {
            loop {
                let len = entry
                    .szExeFile
                    .iter()
                    .position(|&c| c == 0)
                    .unwrap_or(entry.szExeFile.len());
                let name = String::from_utf16_lossy(&entry.szExeFile[..len]);

                if name_matches(&name, process_name) {
                    found = Some((entry.th32ProcessID, name));
                    break;
                }

                if Process32NextW(snapshot, &mut entry).is_err() {
                    break;
                }
            }
        }

        let _ = CloseHandle(snapshot);

        let (pid, name) = found?;
        let (base_address, module_size) = get_main_module(pid, &name)?;
        Some(ProcessInfo {
            pid,
            name,
            base_address,
            module_size,
            is_64_bit: std::mem::size_of::<usize>() == 8,
        })
    }
}

/// Find a process by name (Linux implementation, also matches Proton/Wine executables)
#[cfg(target_os = "linux")]
pub fn find_process(process_name: &str) -> Option<ProcessInfo> {
    use std::fs;
    use std::path::Path;

    for entry in fs::read_dir("/proc").ok()?.flatten() {
        let path = entry.path();

        let Some(pid) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|s| s.parse::<u32>().ok())
        else {
            continue;
        };

        let Ok(comm) = fs::read_to_string(path.join("comm")) else {
            continue;
        };
        let comm = comm.trim().to_string();

        // Wine processes show up with the full Windows path in cmdline
        let exe_name = fs::read_to_string(path.join("cmdline"))
            .ok()
            .and_then(|s| s.split('\0').next().map(|s| s.replace('\\', "/")))
            .and_then(|s| Path::new(&s).file_name().map(|n| n.to_string_lossy().to_string()))
            .unwrap_or_else(|| comm.clone());

        if name_matches(&comm, process_name) || name_matches(&exe_name, process_name) {
            if let Some((base, size)) = get_module_base_from_maps(pid) {
                return Some(ProcessInfo {
                    pid,
                    name: exe_name,
                    base_address: base,
                    module_size: size,
                    is_64_bit: std::mem::size_of::<usize>() == 8,
                });
            }
        }
    }

    None
}

/// Get base address and size of a module in a process
#[cfg(target_os = "windows")]
fn get_main_module(pid: u32, module_name: &str) -> Option<(usize, usize)> {
    use windows::Win32::Foundation::CloseHandle;
    use windows::Win32::System::Diagnostics::ToolHelp::{
        CreateToolhelp32Snapshot, Module32FirstW, Module32NextW, MODULEENTRY32W,
        TH32CS_SNAPMODULE, TH32CS_SNAPMODULE32,
    };

    unsafe {
        let snapshot =
            CreateToolhelp32Snapshot(TH32CS_SNAPMODULE | TH32CS_SNAPMODULE32, pid).ok()?;

        let mut entry = MODULEENTRY32W {
            dwSize: std::mem::size_of::<MODULEENTRY32W>() as u32,
            ..Default::default()
        };

        let mut result = None;
        if Module32FirstW(snapshot, &mut entry).is_ok() {
            loop {
                let len = entry
                    .szModule
                    .iter()
                    .position(|&c| c == 0)
                    .unwrap_or(entry.szModule.len());
                let name = String::from_utf16_lossy(&entry.szModule[..len]);

                if name_matches(&name, module_name) {
                    result = Some((entry.modBaseAddr as usize, entry.modBaseSize as usize));
                    break;
                }

                if Module32NextW(snapshot, &mut entry).is_err() {
                    break;
                }
            }
        }

        let _ = CloseHandle(snapshot);
        result
    }
}

/// Parse /proc/[pid]/maps to get base address and size of the first mapped image
#[cfg(target_os = "linux")]
fn get_module_base_from_maps(pid: u32) -> Option<(usize, usize)> {
    let maps = std::fs::read_to_string(format!("/proc/{}/maps", pid)).ok()?;

    let mut base_address = None;
    let mut end_address = 0usize;

    for line in maps.lines() {
        if !line.contains("r-x") && !line.contains("r--") {
            continue;
        }

        let Some(range) = line.split_whitespace().next() else {
            continue;
        };
        let Some((start, end)) = range.split_once('-') else {
            continue;
        };

        let start = usize::from_str_radix(start, 16).ok()?;
        let end = usize::from_str_radix(end, 16).ok()?;

        if base_address.is_none() {
            base_address = Some(start);
        }
        end_address = end;
    }

    let base = base_address?;
    Some((base, end_address - base))
}

/// Check if a process is still running by its PID
#[cfg(target_os = "windows")]
pub fn is_process_running(pid: u32) -> bool {
    use windows::Win32::Foundation::CloseHandle;
    use windows::Win32::System::Threading::{
        GetExitCodeProcess, OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION,
    };

    // STILL_ACTIVE is 259 (STATUS_PENDING)
    const STILL_ACTIVE: u32 = 259;

    unsafe {
        if let Ok(handle) = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid) {
            let mut exit_code = 0u32;
            let alive = GetExitCodeProcess(handle, &mut exit_code).is_ok() && exit_code == STILL_ACTIVE;
            let _ = CloseHandle(handle);
            return alive;
        }
    }

    false
}

/// Check if a process is still running by its PID (Linux)
#[cfg(target_os = "linux")]
pub fn is_process_running(pid: u32) -> bool {
    std::path::Path::new(&format!("/proc/{}", pid)).exists()
}

/// Find a process by any of the given names, first match wins
#[cfg(any(target_os = "windows", target_os = "linux"))]
pub fn find_process_by_names(process_names: &[&str]) -> Option<ProcessInfo> {
    process_names.iter().find_map(|name| find_process(name))
}

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
pub fn find_process(_process_name: &str) -> Option<ProcessInfo> {
    None
}

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
pub fn find_process_by_names(_process_names: &[&str]) -> Option<ProcessInfo> {
    None
}

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
pub fn is_process_running(_pid: u32) -> bool {
    false
}
