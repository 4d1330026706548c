use std::ffi::CString;
use std::io;
use std::path::Path;
use std::process;
use std::ptr::null;

use clap::{Arg, Command};
use libc::{rlimit64, setrlimit64, RLIMIT_AS, RLIMIT_CPU};

fn fail(msg: &str) -> ! {
    eprintln!("cell: {}", msg);
    process::exit(1);
}

fn main() {
    let cmd = Command::new("Code Loader")
        .version("0.1.0")
        .author("Kanari <iovo7c@gmail.com>")
        .about("Limit loader")
        .arg(
            Arg::new("memory_limit")
                .long("memory_limit")
                .short('m')
                .help("set memory limit(MB) for code")
                .takes_value(true),
        )
        .arg(
            Arg::new("time_limit")
                .long("time_limit")
                .short('t')
                .help("set cpu time limit(s) for code")
                .takes_value(true),
        )
        .arg(
            Arg::new("path")
                .index(1)
                .help("execution path")
                .required(true),
        )
        .arg(
            Arg::new("raw")
                .multiple_values(true)
                .last(true)
                .help("arguments for code"),
        )
        .get_matches();

    // check if path exists
    let path = cmd.value_of("path").unwrap_or_default();
    if !Path::new(path).exists() {
        fail("path does not exist");
    }

    // construct parameters passed to exec
    let mut params = vec![path];
    if let Some(raw) = cmd.values_of("raw") {
        params.extend(raw);
    }
    let params = match params
        .into_iter()
        .map(CString::new)
        .collect::<Result<Vec<CString>, _>>()
    {
        Ok(params) => params,
        Err(_) => fail("argument contains a NUL byte"),
    };
    let mut raw_params: Vec<*const libc::c_char> = params.iter().map(|p| p.as_ptr()).collect();
    raw_params.push(null());

    // set memory and time limit
    if let Some(memory_limit) = cmd.value_of("memory_limit") {
        match memory_limit.trim().parse::<u64>() {
            Ok(lim) => set_memory_limit(lim),
            Err(_) => fail("memory limit is not a number"),
        }
    }
    if let Some(time_limit) = cmd.value_of("time_limit") {
        match time_limit.trim().parse::<u64>() {
            Ok(lim) => set_time_limit(lim),
            Err(_) => fail("time limit is not a number"),
        }
    }

    unsafe {
        libc::execv(params[0].as_ptr(), raw_params.as_ptr());
    }
    fail(&format!("exec failed: {}", io::Error::last_os_error()));
}

fn check(ret: libc::c_int) {
    if ret != 0 {
        fail(&format!("setrlimit failed: {}", io::Error::last_os_error()));
    }
}

// address space, not resident memory: runtimes reserve far more than they touch
fn set_memory_limit(lim: u64) {
    let ctx = rlimit64 {
        rlim_cur: lim << 10 << 10 << 1,
        rlim_max: lim << 10 << 10 << 1,
    };
    let ctx: *const rlimit64 = &ctx;
    unsafe {
        check(setrlimit64(RLIMIT_AS, ctx));
    }
}

// SIGXCPU at the limit, SIGKILL one second later
fn set_time_limit(lim: u64) {
    let ctx = rlimit64 {
        rlim_cur: lim,
        rlim_max: lim + 1,
    };
    let ctx: *const rlimit64 = &ctx;
    unsafe {
        check(setrlimit64(RLIMIT_CPU, ctx));
    }
}
