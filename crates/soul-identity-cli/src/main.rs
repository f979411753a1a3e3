//! SoulIdentity CLI — `soulid` command.
//!
//! Read-only tooling around soul-identity records: convert between
//! identifiers and public keys, hash soul files, canonicalize JSON, and
//! verify documents, attestations, receipts and key chains. Nothing here
//! creates or stores key material.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use ed25519_dalek::VerifyingKey;
use serde_json::{json, Value};

use soul_identity::identity::IDENTIFIER_PREFIX;
use soul_identity::{
    canonicalize, compute_soul_hash, derive_identifier, hash_content, public_key_from_hex,
    public_key_to_hex, verify_attestation, verify_attestation_with_chain, verify_document,
    verify_document_with_chain, verify_key_chain, verify_receipt_with_chains, AgentDocument,
    AgentId, IntegrityAttestation, InteractionReceipt, KeyChain,
};

// ── CLI structure ─────────────────────────────────────────────────────────────

/// SoulIdentity CLI — inspect and verify agent identity records.
#[derive(Parser, Debug)]
#[command(
    name = "soulid",
    about = "SoulIdentity CLI",
    version,
    long_about = "soulid — SoulIdentity CLI\n\nConvert identifiers, hash soul files, and verify agent documents,\nintegrity attestations, interaction receipts and key chains."
)]
struct Cli {
    /// Emit machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Derive the identifier of a public key
    Identifier {
        /// Ed25519 public key, 64 hex characters
        public_key: String,
    },

    /// Recover the public key behind an identifier
    PublicKey {
        /// Identifier (did:soul:...)
        identifier: String,
    },

    /// Compute the soul hash of a set of files (named by basename)
    Hash {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Print the canonical form of a JSON file
    Canonicalize { file: PathBuf },

    /// Verify a signed record
    Verify {
        #[command(subcommand)]
        subcommand: VerifyCommands,
    },
}

#[derive(Subcommand, Debug)]
enum VerifyCommands {
    /// Verify an agent document
    Document {
        file: PathBuf,

        /// Key chain for an identity whose key has rotated
        #[arg(long)]
        chain: Option<PathBuf>,
    },

    /// Verify an integrity attestation against the current files
    Attestation {
        /// Attestation JSON
        file: PathBuf,

        /// Signer identifier or public key hex
        #[arg(long, required_unless_present = "chain", conflicts_with = "chain")]
        signer: Option<String>,

        /// Key chain of the signer
        #[arg(long)]
        chain: Option<PathBuf>,

        /// Current soul files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Verify an interaction receipt
    Receipt {
        file: PathBuf,

        /// Key chain of the issuer
        #[arg(long)]
        from_chain: Option<PathBuf>,

        /// Key chain of the recipient
        #[arg(long)]
        to_chain: Option<PathBuf>,
    },

    /// Verify a key chain
    Chain { file: PathBuf },
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let text = read_text(path)?;
    serde_json::from_str(&text)
        .with_context(|| format!("{} is not a valid {what}", path.display()))
}

/// Parse a chain; revocations count once its current key has signed them.
fn read_chain(path: Option<&Path>) -> Result<Option<KeyChain>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let chain: KeyChain = read_json(path, "key chain")?;
    Ok(Some(chain.verify_own_revocations()))
}

/// Read files keyed by basename; a later duplicate name replaces an earlier one.
fn read_files(paths: &[PathBuf]) -> Result<BTreeMap<String, Vec<u8>>> {
    let mut files = BTreeMap::new();
    for path in paths {
        let name = path
            .file_name()
            .ok_or_else(|| anyhow!("{} has no file name", path.display()))?
            .to_string_lossy()
            .into_owned();
        let content =
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        files.insert(name, content);
    }
    Ok(files)
}

fn parse_signer(signer: &str) -> Result<VerifyingKey> {
    if signer.starts_with(IDENTIFIER_PREFIX) {
        Ok(AgentId::parse(signer)?.to_verifying_key()?)
    } else {
        Ok(public_key_from_hex(signer)?)
    }
}

fn verdict(valid: bool) -> &'static str {
    if valid {
        "VALID"
    } else {
        "INVALID"
    }
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let json = cli.json;
    let verbose = cli.verbose;

    let result = match cli.command {
        Commands::Identifier { public_key } => cmd_identifier(&public_key, json).map(|_| true),
        Commands::PublicKey { identifier } => cmd_public_key(&identifier, json).map(|_| true),
        Commands::Hash { files } => cmd_hash(&files, json, verbose).map(|_| true),
        Commands::Canonicalize { file } => cmd_canonicalize(&file).map(|_| true),
        Commands::Verify { subcommand } => match subcommand {
            VerifyCommands::Document { file, chain } => {
                cmd_verify_document(&file, chain.as_deref(), json, verbose)
            }
            VerifyCommands::Attestation {
                file,
                signer,
                chain,
                files,
            } => cmd_verify_attestation(
                &file,
                signer.as_deref(),
                chain.as_deref(),
                &files,
                json,
                verbose,
            ),
            VerifyCommands::Receipt {
                file,
                from_chain,
                to_chain,
            } => cmd_verify_receipt(
                &file,
                from_chain.as_deref(),
                to_chain.as_deref(),
                json,
                verbose,
            ),
            VerifyCommands::Chain { file } => cmd_verify_chain(&file, json, verbose),
        },
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// `soulid identifier HEX`
fn cmd_identifier(public_key: &str, json: bool) -> Result<()> {
    let key = public_key_from_hex(public_key).context("invalid public key")?;
    let id = derive_identifier(&key);
    if json {
        print_json(&json!({ "identifier": id, "publicKey": public_key_to_hex(&key) }))
    } else {
        println!("{id}");
        Ok(())
    }
}

/// `soulid public-key IDENTIFIER`
fn cmd_public_key(identifier: &str, json: bool) -> Result<()> {
    let id = AgentId::parse(identifier).context("invalid identifier")?;
    let key = public_key_to_hex(&id.to_verifying_key()?);
    if json {
        print_json(&json!({ "identifier": id, "publicKey": key }))
    } else {
        println!("{key}");
        Ok(())
    }
}

/// `soulid hash FILE...`
fn cmd_hash(paths: &[PathBuf], json: bool, verbose: bool) -> Result<()> {
    let files = read_files(paths)?;
    let soul_hash = compute_soul_hash(&files);

    if json {
        let per_file: BTreeMap<&str, String> = files
            .iter()
            .map(|(name, content)| (name.as_str(), hash_content(content).to_string()))
            .collect();
        return print_json(&json!({ "soulHash": soul_hash, "files": per_file }));
    }

    if verbose {
        for (name, content) in &files {
            println!("{}  {name}", hash_content(content));
        }
    }
    println!("{soul_hash}");
    Ok(())
}

/// `soulid canonicalize FILE`
fn cmd_canonicalize(path: &Path) -> Result<()> {
    let value: Value = read_json(path, "JSON document")?;
    println!("{}", canonicalize(&value)?);
    Ok(())
}

/// `soulid verify document FILE [--chain FILE]`
fn cmd_verify_document(
    path: &Path,
    chain: Option<&Path>,
    json: bool,
    verbose: bool,
) -> Result<bool> {
    let doc: AgentDocument = read_json(path, "agent document")?;
    let chain = read_chain(chain)?;
    let valid = match &chain {
        Some(chain) => verify_document_with_chain(&doc, chain),
        None => verify_document(&doc),
    };

    if json {
        print_json(&json!({
            "valid": valid,
            "id": doc.id,
            "name": doc.name,
            "verificationMethod": doc.proof.verification_method,
        }))?;
        return Ok(valid);
    }

    println!("Document: {}", doc.id);
    println!("  Name:      {}", doc.name);
    if let Some(ref version) = doc.version {
        println!("  Version:   {version}");
    }
    println!("  Created:   {}", doc.created);
    if let Some(ref owner) = doc.owner {
        println!("  Owner:     {}", owner.owner);
    }
    if let Some(ref att) = doc.integrity {
        println!("  Soul hash: {}", att.soul_hash);
    }
    if verbose {
        if let Some(ref caps) = doc.capabilities {
            println!("  Capabilities: {}", caps.join(", "));
        }
        println!("  Method:    {}", doc.proof.verification_method);
        if !doc.extensions.is_empty() {
            let keys: Vec<&str> = doc.extensions.keys().map(String::as_str).collect();
            println!("  Extensions: {}", keys.join(", "));
        }
    }
    println!();
    println!("Result: {}", verdict(valid));
    Ok(valid)
}

/// `soulid verify attestation FILE (--signer ID|HEX | --chain FILE) FILE...`
fn cmd_verify_attestation(
    path: &Path,
    signer: Option<&str>,
    chain: Option<&Path>,
    paths: &[PathBuf],
    json: bool,
    verbose: bool,
) -> Result<bool> {
    let attestation: IntegrityAttestation = read_json(path, "attestation")?;
    let files = read_files(paths)?;

    let result = match (signer, read_chain(chain)?) {
        (_, Some(chain)) => verify_attestation_with_chain(&attestation, &files, &chain),
        (Some(signer), None) => {
            let key = parse_signer(signer).context("invalid signer")?;
            verify_attestation(&attestation, &files, &key)
        }
        (None, None) => bail!("either --signer or --chain is required"),
    };

    if json {
        print_json(&json!({
            "intact": result.intact,
            "signatureValid": result.signature_valid,
            "hashMatch": result.hash_match,
            "attestedHash": attestation.soul_hash,
            "currentHash": result.current_hash,
        }))?;
        return Ok(result.intact);
    }

    println!("Attestation ({})", attestation.attested_at);
    println!("  Attested:  {}", attestation.soul_hash);
    println!("  Current:   {}", result.current_hash);
    if verbose {
        println!("  Files:     {}", attestation.files.join(", "));
    }
    println!();
    println!("Verification:");
    println!("  Signature: {}", verdict(result.signature_valid));
    println!(
        "  Hash:      {}",
        if result.hash_match { "MATCH" } else { "CHANGED" }
    );
    println!();
    println!("Result: {}", if result.intact { "INTACT" } else { "TAMPERED" });
    Ok(result.intact)
}

/// `soulid verify receipt FILE [--from-chain FILE] [--to-chain FILE]`
fn cmd_verify_receipt(
    path: &Path,
    from_chain: Option<&Path>,
    to_chain: Option<&Path>,
    json: bool,
    verbose: bool,
) -> Result<bool> {
    let receipt: InteractionReceipt = read_json(path, "receipt")?;
    let from_chain = read_chain(from_chain)?;
    let to_chain = read_chain(to_chain)?;
    let verification =
        verify_receipt_with_chains(&receipt, from_chain.as_ref(), to_chain.as_ref());

    if json {
        print_json(&json!({
            "id": receipt.id,
            "fromValid": verification.from_valid,
            "toValid": verification.to_valid,
            "isValid": verification.is_valid,
        }))?;
        return Ok(verification.is_valid);
    }

    println!("Receipt: {}", receipt.id);
    println!("  From:      {}", receipt.from);
    println!("  To:        {}", receipt.to);
    println!("  Action:    {}", receipt.action);
    println!("  Quality:   {}", receipt.quality);
    println!("  Timestamp: {}", receipt.timestamp);
    if verbose {
        if let Some(ref ctx) = receipt.context {
            println!("  Context:   {ctx}");
        }
    }

    println!();
    println!("Verification:");
    println!("  Issuer:    {}", verdict(verification.from_valid));
    match verification.to_valid {
        Some(valid) => println!("  Recipient: {}", verdict(valid)),
        None => println!("  Recipient: not countersigned"),
    }
    println!();
    println!("Result: {}", verdict(verification.is_valid));
    Ok(verification.is_valid)
}

/// `soulid verify chain FILE`
fn cmd_verify_chain(path: &Path, json: bool, verbose: bool) -> Result<bool> {
    let chain: KeyChain = read_json(path, "key chain")?;
    let verification = verify_key_chain(&chain);

    let identifier = chain.identifier().ok();
    let chain = chain.verify_own_revocations();
    let revoked: Vec<&str> = chain.verified_revocations().map(|r| r.revoked_key()).collect();
    let unverified = chain.revocations.len() - revoked.len();

    if json {
        print_json(&json!({
            "valid": verification.valid,
            "identifier": identifier,
            "currentKey": verification.current_key,
            "brokenAt": verification.broken_at,
            "failure": verification.failure.map(|f| f.to_string()),
            "rotations": chain.rotations.len(),
            "revokedKeys": revoked,
            "unverifiedRevocations": unverified,
        }))?;
        return Ok(verification.valid);
    }

    if let Some(ref id) = identifier {
        println!("Key chain: {id}");
    } else {
        println!("Key chain: (malformed original key)");
    }
    println!("  Original:  {}", chain.original_key);
    println!("  Current:   {}", verification.current_key);
    println!("  Rotations: {}", chain.rotations.len());
    if verbose {
        for (i, rotation) in chain.rotations.iter().enumerate() {
            println!(
                "    [{i}] {} {} -> {}",
                rotation.timestamp,
                rotation.reason.as_str(),
                rotation.new_key
            );
        }
    }
    if !revoked.is_empty() {
        println!("  Revoked:");
        for key in &revoked {
            println!("    - {key}");
        }
    }
    if unverified > 0 {
        println!("  Ignored {unverified} unverified revocation(s)");
    }

    println!();
    if let Some(failure) = verification.failure {
        match verification.broken_at {
            Some(i) => println!("Broken at rotation {i}: {failure}"),
            None => println!("Broken: {failure}"),
        }
    }
    println!("Result: {}", verdict(verification.valid));
    Ok(verification.valid)
}
