use clap::Parser;

/// This is a summary program for staff error and livechat spreadsheets.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON configuration: site to leader assignments, special sheets,
    /// global settings and hidden sheets. See the manual of rekap_engine for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (livechat or kesalahan, default livechat) The pipeline to run.
    #[clap(short, long, value_parser)]
    pub domain: Option<String>,

    /// (file path) A reference summary in JSON format. If provided, rekap will
    /// check that the produced summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary will be written in JSON format to the given
    /// location. Setting this option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or directory) The workbook (.xlsx) or the directory of CSV exports, one file per sheet.
    /// Setting this option overrides what may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (xlsx or csv) The type of the input. Guessed from the input path when not provided.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (MM-YYYY or all, default all) The month to summarise.
    #[clap(short, long, value_parser)]
    pub month: Option<String>,

    /// (sheet name) Instead of the summary, prints the detail of one sheet.
    #[clap(long, value_parser)]
    pub sheet: Option<String>,

    /// (directory) Where configuration and sheet reads are cached. No caching when absent.
    #[clap(long, value_parser)]
    pub cache_dir: Option<String>,

    /// If passed as an argument, only prints the months that can be selected.
    #[clap(long, takes_value = false)]
    pub list_months: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
