use std::fmt::Write as _;

use crate::{COMMANDS, CommandMeta, find_command};

pub const META: CommandMeta = CommandMeta {
    name: "help",
    desc: "List commands, or show one command's usage.",
    usage: "tutor help [command]",
};

pub fn run(args: &[String]) -> String {
    if let Some(name) = args.first() {
        return match find_command(name) {
            Some(meta) => format!("{}\n\nUsage: `{}`", meta.desc, meta.usage),
            None => format!("Unknown command `{}`.", name),
        };
    }

    let width = COMMANDS.iter().map(|meta| meta.name.len()).max().unwrap_or(0);
    let mut out = String::from("Commands:\n");
    for meta in COMMANDS {
        let _ = writeln!(out, "  {:<width$}  {}", meta.name, meta.desc, width = width);
    }
    out.trim_end().to_owned()
}
