mod csv;
mod format;
mod json;
mod table;

pub(crate) use csv::output_split_issues_csv;
pub(crate) use json::{
    output_diff_json, output_hash_json, output_run_json, output_sessions_json, output_split_json,
    output_verify_json,
};
pub(crate) use table::{
    print_diff, print_hash_summary, print_run_summary, print_sessions_table, print_split_report,
    print_verify_report,
};
