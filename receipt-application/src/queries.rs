pub mod receipt_queries;
