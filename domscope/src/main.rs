use clap::Parser;
use domscope_lib::inspect::protocol::{self, MessageEndpoint};
use domscope_lib::inspect::rules::Provenance;
use domscope_lib::inspect::session::InspectorSession;
use std::fs;

const DOMSCOPE_INTRO: &str = r#"
        ____  ____  __  ___
       / __ \/ __ \/  |/  /_____________  ____  ___
      / / / / / / / /|_/ / ___/ ___/ __ \/ __ \/ _ \
     / /_/ / /_/ / /  / (__  ) /__/ /_/ / /_/ /  __/
    /_____/\____/_/  /_/____/\___/\____/ .___/\___/
                                      /_/
    Welcome to DomScope - CSS inspection for HTML documents!
"#;

#[derive(Parser)]
#[command(name = "DomScope")]
#[command(about = "Inspect the CSS applying to elements of an HTML document")]
struct Args {
    /// Input HTML file name.
    input: String,

    /// CSS selector of the element to inspect.
    #[arg(short, long)]
    select: Option<String>,

    /// Page URL whose query parameters control activation
    /// (domscope=1, inspect=<selector>).
    #[arg(long)]
    url: Option<String>,

    /// Natural-language request to embed in the snapshot.
    #[arg(long)]
    request: Option<String>,

    /// JSON protocol message to dispatch instead of inspecting,
    /// e.g. '{"action":"status"}'.
    #[arg(long)]
    message: Option<String>,

    /// Activate the inspector even without a selection.
    #[arg(long)]
    enable: bool,
}

fn main() {
    env_logger::init();
    println!("{}", DOMSCOPE_INTRO);

    let args: Args = Args::parse();

    let html_content = match fs::read_to_string(&args.input) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading HTML file: {}", e);
            std::process::exit(1);
        }
    };

    let mut session = InspectorSession::load(&html_content);
    if args.enable {
        session.enable();
    }

    if let Some(message) = &args.message {
        let mut endpoint = MessageEndpoint::new(session);
        println!("{}", endpoint.handle_json(message));
        return;
    }

    if let Some(url) = &args.url {
        if let Err(e) = protocol::apply_url_parameters(&mut session, url) {
            eprintln!("Error applying URL parameters: {}", e);
            std::process::exit(1);
        }
    }

    if let Some(selector) = &args.select {
        if !session.select_element(selector) {
            eprintln!("No element matches selector: {}", selector);
            std::process::exit(1);
        }
    }

    if session.target().is_none() {
        eprintln!("Nothing selected; pass --select or --url with an inspect parameter.");
        std::process::exit(1);
    }

    match session.display() {
        Ok(model) => {
            if model.no_rules {
                println!("No rules found for the selected element.");
            }
            for group in &model.groups {
                let marker = match group.provenance {
                    Provenance::Inline => "inline",
                    Provenance::Stylesheet => "stylesheet",
                    Provenance::Inherited => "inherited",
                    Provenance::Computed => "computed",
                };
                println!("[{}] {} (specificity {})", marker, group.selector_label, group.specificity);
                for prop in &group.properties {
                    let changed = if prop.is_changed { "  *" } else { "" };
                    println!("    {}: {};{}", prop.name, prop.display_value, changed);
                }
            }
        }
        Err(e) => {
            eprintln!("Inspection failed: {}", e);
            std::process::exit(1);
        }
    }

    match session.snapshot(args.request.as_deref()) {
        Ok(snapshot) => {
            println!();
            println!("{}", snapshot);
        }
        Err(e) => {
            eprintln!("Snapshot failed: {}", e);
            std::process::exit(1);
        }
    }
}
