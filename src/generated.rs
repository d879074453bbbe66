include!(concat!(env!("OUT_DIR"), "/generated_program.rs"));
