use shukatsu::cli::{is_internal, run};

fn main() {
    env_logger::init();
    // Windows consoles need this for the ANSI colors in list output
    let _ = enable_ansi_support::enable_ansi_support();

    if let Err(e) = run() {
        if is_internal(&e) {
            eprintln!("Internal error: {}", e);
            // Show error chain if available
            let mut causes = e.chain().skip(1).peekable();
            if causes.peek().is_some() {
                eprintln!("\nCaused by:");
                for (indent, err) in causes.enumerate() {
                    eprintln!("{:indent$}  {}", "", err, indent = indent + 1);
                }
            }
            std::process::exit(2);
        } else {
            // User error
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
