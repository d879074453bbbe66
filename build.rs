use std::env;
use std::fs;
use std::path::Path;

fn main() {
    println!("cargo:rerun-if-changed=src/instructions");

    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("generated_program.rs");

    // Parse instruction files and extract metadata
    let instructions = extract_instruction_metadata();
    check_discriminators(&instructions);

    let generated_code = generate_program_code(&instructions);
    fs::write(&dest_path, &generated_code).unwrap();
}

#[derive(Debug)]
struct InstructionMeta {
    name: String,
    discriminator: u8,
    accounts: Vec<AccountMeta>,
    fields: Vec<FieldMeta>,
}

#[derive(Debug)]
struct AccountMeta {
    name: String,
    index: usize,
    desc: String,
    attrs: Vec<&'static str>,
}

#[derive(Debug)]
struct FieldMeta {
    name: String,
    field_type: String,
}

fn extract_instruction_metadata() -> Vec<InstructionMeta> {
    let mut instructions = Vec::new();

    let instruction_dir = Path::new("src/instructions");
    for entry in fs::read_dir(instruction_dir).unwrap() {
        let path = entry.unwrap().path();

        if path.extension().and_then(|s| s.to_str()) == Some("rs")
            && path.file_name().and_then(|s| s.to_str()) != Some("mod.rs")
        {
            if let Some(instruction) = parse_instruction_file(&path) {
                instructions.push(instruction);
            }
        }
    }

    instructions.sort_by_key(|i| i.discriminator);
    instructions
}

fn check_discriminators(instructions: &[InstructionMeta]) {
    for pair in instructions.windows(2) {
        if pair[0].discriminator == pair[1].discriminator {
            panic!(
                "{} and {} share discriminator {}",
                pair[0].name, pair[1].name, pair[0].discriminator
            );
        }
    }
}

fn parse_instruction_file(path: &Path) -> Option<InstructionMeta> {
    let content = fs::read_to_string(path).ok()?;

    let start = content.find("define_instruction!(")?;
    let mut paren_count = 0;
    let mut in_macro = false;
    let mut macro_content = String::new();

    for ch in content[start..].chars() {
        if ch == '(' {
            paren_count += 1;
            in_macro = true;
        } else if ch == ')' {
            paren_count -= 1;
        }

        if in_macro {
            macro_content.push(ch);
        }

        if paren_count == 0 && in_macro {
            break;
        }
    }

    parse_macro_content(&macro_content)
}

fn parse_macro_content(content: &str) -> Option<InstructionMeta> {
    let mut name = String::new();
    let mut discriminator = None;
    let mut accounts = Vec::new();
    let mut fields = Vec::new();

    let mut in_accounts = false;
    let mut in_data = false;

    for line in content.lines() {
        let line = line.trim();

        if let Some(value) = line.strip_prefix("discriminant:") {
            discriminator = value.trim().trim_end_matches(',').parse().ok();
            continue;
        }

        // The instruction name is the bare identifier after the discriminant
        if name.is_empty() && discriminator.is_some() && !line.contains(':') && line.ends_with(',') {
            name = line.trim_end_matches(',').to_string();
            continue;
        }

        if line.starts_with("accounts:") {
            in_accounts = true;
            in_data = false;
            continue;
        } else if line.starts_with("data:") {
            in_accounts = false;
            in_data = true;
            continue;
        }

        if in_accounts && line.contains("desc:") {
            if let Some(account) = parse_account_line(line, accounts.len()) {
                accounts.push(account);
            }
        }

        if in_data && line.contains(':') && !line.starts_with('}') {
            if let Some(field) = parse_field_line(line) {
                fields.push(field);
            }
        }
    }

    if name.is_empty() {
        return None;
    }

    Some(InstructionMeta {
        name,
        discriminator: discriminator?,
        accounts,
        fields,
    })
}

fn parse_account_line(line: &str, index: usize) -> Option<AccountMeta> {
    // authority: signer => writable, desc: "Authority of the vault",
    let (name, rest) = line.split_once(':')?;
    let (kind, desc) = rest.split_once("desc:")?;
    let kind = kind.trim().trim_end_matches(',');
    let desc = desc.trim().trim_end_matches(',').trim_matches('"');

    let attrs = match kind {
        "signer => writable" => vec!["signer", "writable"],
        "signer" => vec!["signer"],
        "writable" => vec!["writable"],
        "readonly" => vec![],
        other => panic!("unknown account kind '{other}' for {}", name.trim()),
    };

    Some(AccountMeta {
        name: name.trim().to_string(),
        index,
        desc: desc.to_string(),
        attrs,
    })
}

fn parse_field_line(line: &str) -> Option<FieldMeta> {
    let (name, field_type) = line.split_once(':')?;

    Some(FieldMeta {
        name: name.trim().to_string(),
        field_type: field_type.trim().trim_end_matches(',').to_string(),
    })
}

fn generate_program_code(instructions: &[InstructionMeta]) -> String {
    let mut code = String::new();

    code.push_str("use shank::ShankInstruction;\n\n");

    // Shank enum, the IDL view of every instruction the client can build
    code.push_str("#[repr(u8)]\n");
    code.push_str("#[derive(Clone, Debug, PartialEq, ShankInstruction)]\n");
    code.push_str("pub enum ProgramInstructions {\n");

    for instruction in instructions {
        for account in &instruction.accounts {
            code.push_str(&format!("    #[account({}", account.index));
            for attr in &account.attrs {
                code.push_str(&format!(", {attr}"));
            }
            code.push_str(&format!(
                ", name = \"{}\", desc = \"{}\")]\n",
                account.name, account.desc
            ));
        }

        code.push_str(&format!("    {} {{\n", instruction.name));
        for field in &instruction.fields {
            code.push_str(&format!("        {}: {},\n", field.name, field.field_type));
        }
        code.push_str("    },\n\n");
    }
    code.push_str("}\n\n");

    // Discriminator lookup used to name the instruction behind an on-chain error
    code.push_str("pub const INSTRUCTION_NAMES: &[(u8, &str)] = &[\n");
    for instruction in instructions {
        code.push_str(&format!(
            "    ({}, \"{}\"),\n",
            instruction.discriminator, instruction.name
        ));
    }
    code.push_str("];\n\n");

    code.push_str("pub fn instruction_name(discriminator: u8) -> Option<&'static str> {\n");
    code.push_str("    match discriminator {\n");
    for instruction in instructions {
        code.push_str(&format!(
            "        {} => Some(\"{}\"),\n",
            instruction.discriminator, instruction.name
        ));
    }
    code.push_str("        _ => None,\n");
    code.push_str("    }\n");
    code.push_str("}\n");

    code
}
