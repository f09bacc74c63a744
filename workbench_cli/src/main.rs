// course_site/workbench_cli/src/main.rs

use std::io::{self, Write};

use clap::Parser;
use clearscreen::clear;
use inquire::{Confirm, CustomType, Select, Text};
use reqwest::Client;
use tracing_subscriber::EnvFilter;
use workbench_core::{
    ErrorBody, KeyField, LinkKind, LinkResponse, RsaProvider, Session, Severity, VerifyOutcome,
    WorkbenchConfig,
};

const GENERATE: &str = "1. Generate key pairs";
const ENCRYPT: &str = "2. Encrypt and sign a message";
const VERIFY: &str = "3. Verify and decrypt";
const IMPORT: &str = "4. Import keys (JWK)";
const SHOW_STATE: &str = "5. Show keys and current state";
const SHOW_LOG: &str = "6. Show operation log";
const CLEAR_LOG: &str = "7. Clear operation log";
const LINK: &str = "8. Look up a writeup link";
const RESET: &str = "9. Reset session";
const QUIT: &str = "10. Quit";

#[derive(Debug, Parser)]
#[command(version, about = "Terminal RSA encrypt-then-sign workbench")]
struct Arguments {
    /// Base URL of the site server, used for link lookups.
    #[arg(short, long, default_value = "http://127.0.0.1:3000")]
    server: String,
}

type Workbench = Session<RsaProvider>;

fn pause() -> io::Result<()> {
    println!("\nPress Enter to continue...");
    io::stdout().flush()?;
    io::stdin().read_line(&mut String::new())?;
    Ok(())
}

fn report(session: &Workbench, result: Result<(), workbench_core::WorkbenchError>, done: &str) {
    match result {
        Ok(()) => println!("✅ {done}"),
        Err(e) => {
            eprintln!("❌ {e}");
            if let Some(entry) = session.log_entries().last() {
                eprintln!("   {}", entry.details);
            }
        }
    }
}

fn generate(session: &mut Workbench) {
    println!(
        "Generating two {}-bit key pairs (RSA-OAEP and RSA-PSS)...",
        session.config().key_spec.modulus_bits
    );
    let result = session.generate_key_pairs();
    report(session, result, "Key pairs generated.");
}

fn encrypt(session: &mut Workbench) {
    let max = session.config().max_message_chars;
    let Ok(message) = Text::new(&format!("Message (at most {max} characters):")).prompt() else {
        return;
    };
    let result = session.encrypt_and_sign(&message);
    let ok = result.is_ok();
    report(session, result, "Message encrypted, then signed.");
    if ok {
        let state = session.state();
        println!("\nEncrypted message (base64):\n{}", state.encrypted_message.as_deref().unwrap_or_default());
        println!("\nSignature (base64):\n{}", state.signature.as_deref().unwrap_or_default());
    }
}

fn verify(session: &mut Workbench) {
    let paste = Confirm::new("Paste an encrypted message and signature instead of using the last output?")
        .with_default(false)
        .prompt()
        .unwrap_or(false);

    let (ciphertext, signature) = if paste {
        let ciphertext = Text::new("Encrypted message (base64):").prompt().unwrap_or_default();
        let signature = Text::new("Signature (base64):").prompt().unwrap_or_default();
        (ciphertext, signature)
    } else {
        (String::new(), String::new())
    };

    match session.verify_and_decrypt(Some(&ciphertext), Some(&signature)) {
        Ok(VerifyOutcome::Verified(message)) => {
            println!("✅ Signature valid. Decrypted message:\n{message}");
        }
        Ok(VerifyOutcome::Rejected) => {
            eprintln!("❌ Signature verification failed. The message was not decrypted.");
        }
        Err(e) => {
            eprintln!("❌ {e}");
            if let Some(entry) = session.log_entries().last() {
                eprintln!("   {}", entry.details);
            }
        }
    }
}

fn import(session: &mut Workbench) {
    println!("Paste each key as single-line JWK JSON, as printed by \"{SHOW_STATE}\". Leave empty to skip.");
    for field in KeyField::ALL {
        loop {
            let Ok(text) = Text::new(&format!("{field}:")).prompt() else {
                return;
            };
            match session.stage_import_field(field, text.trim()) {
                Ok(()) => break,
                Err(e) => eprintln!("⚠️  {e}"),
            }
        }
    }
    let result = session.import_staged_keys();
    report(session, result, "Keys imported.");
}

/// Re-serialises a stored JWK on one line so it can be pasted back into a
/// single-line prompt.
fn single_line(jwk: &str) -> String {
    serde_json::from_str::<serde_json::Value>(jwk)
        .map(|value| value.to_string())
        .unwrap_or_else(|_| jwk.to_string())
}

fn show_state(session: &Workbench) {
    let state = session.state();
    println!("\n--- Workbench state ---");
    match (&state.encryption_keys, &state.signing_keys) {
        (Some(encryption), Some(signing)) => {
            println!("Encryption public key (RSA-OAEP):\n{}", single_line(&encryption.public_key));
            println!("Encryption private key (RSA-OAEP):\n{}", single_line(&encryption.private_key));
            println!("Signing public key (RSA-PSS):\n{}", single_line(&signing.public_key));
            println!("Signing private key (RSA-PSS):\n{}", single_line(&signing.private_key));
        }
        _ => println!("No keys yet. Generate or import them first."),
    }
    if !state.message.is_empty() {
        println!("Message: {}", state.message);
    }
    if let Some(encrypted) = &state.encrypted_message {
        println!("Encrypted message: {encrypted}");
    }
    if let Some(signature) = &state.signature {
        println!("Signature: {signature}");
    }
    match state.verification {
        Some(true) => println!("Verification: valid"),
        Some(false) => println!("Verification: FAILED"),
        None => println!("Verification: not run"),
    }
    if let Some(decrypted) = &state.decrypted_message {
        println!("Decrypted message: {decrypted}");
    }
    if let Some(error) = &state.error {
        println!("Last error: {error}");
    }
    println!("-----------------------");
}

fn show_log(session: &Workbench) {
    let log = session.log_entries();
    if log.is_empty() {
        println!("No operations performed yet.");
        return;
    }
    for entry in log.entries() {
        let marker = match entry.severity {
            Severity::Info => "  ",
            Severity::Success => "✅",
            Severity::Error => "❌",
        };
        println!("{marker} {entry}");
    }
}

async fn fetch_link(
    client: &Client,
    server: &str,
    id: i64,
    kind: LinkKind,
) -> anyhow::Result<Result<LinkResponse, ErrorBody>> {
    tracing::debug!(id, %kind, "looking up link");
    let response = client
        .get(format!("{}/api/links", server.trim_end_matches('/')))
        .query(&[("id", id.to_string()), ("type", kind.to_string())])
        .send()
        .await?;
    if response.status().is_success() {
        Ok(Ok(response.json::<LinkResponse>().await?))
    } else {
        Ok(Err(response.json::<ErrorBody>().await?))
    }
}

async fn lookup_link(client: &Client, server: &str) {
    let Ok(id) = CustomType::<i64>::new("Writeup id:").prompt() else {
        return;
    };
    let Ok(kind) = Select::new("Link type:", vec![LinkKind::Web3, LinkKind::Documentation]).prompt()
    else {
        return;
    };
    match fetch_link(client, server, id, kind).await {
        Ok(Ok(link)) => println!("🔗 {}", link.url),
        Ok(Err(body)) => eprintln!("❌ {}", body.error),
        Err(e) => eprintln!("❌ Could not reach {server}: {e}"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Arguments::parse();
    let client = Client::new();
    let mut session = Session::new(RsaProvider::new(), WorkbenchConfig::default());

    loop {
        clear().unwrap_or_else(|e| eprintln!("Could not clear the screen: {e}"));
        println!("--- RSA-OAEP encryption with authentication (encrypt-then-sign) ---");

        let options = vec![
            GENERATE, ENCRYPT, VERIFY, IMPORT, SHOW_STATE, SHOW_LOG, CLEAR_LOG, LINK, RESET, QUIT,
        ];
        let choice = match Select::new("What would you like to do?", options).prompt() {
            Ok(choice) => choice,
            Err(e) => {
                eprintln!("Could not read the selection: {e}. Exiting.");
                break;
            }
        };

        match choice {
            GENERATE => generate(&mut session),
            ENCRYPT => encrypt(&mut session),
            VERIFY => verify(&mut session),
            IMPORT => import(&mut session),
            SHOW_STATE => show_state(&session),
            SHOW_LOG => show_log(&session),
            CLEAR_LOG => {
                session.clear_log();
                println!("Operation log cleared.");
            }
            LINK => lookup_link(&client, &args.server).await,
            RESET => {
                session.reset();
                println!("Session reset.");
            }
            QUIT => {
                println!("Bye.");
                break;
            }
            _ => unreachable!("unknown menu option"),
        }
        pause()?;
    }
    Ok(())
}
