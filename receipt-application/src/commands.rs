pub mod receipt_commands;
