// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    anyhow::Result,
    apt_lookup::lookup::{LookupConfig, PackageLookup},
    clap::{Arg, ArgMatches, Command},
    std::time::Duration,
};

const ABOUT: &str = "\
# About

`alt` answers package lookup queries against local APT repository mirrors,
the same way the chat bot built on the apt-lookup crate does. It exists so
operators can exercise a mirror directory from a shell.

The apt directory passed via --aptdir holds one `<distro>.list` sources
file per mirrored distribution alongside the apt cache state. Run
`apt-cache gencaches` against that layout to build the caches this tool
queries.

A query is a package or file name, optionally followed by a distribution:

    alt find vim
    alt info 'vim dapper'
    alt find libmagic.h hardy

The reply is printed to stdout exactly as the bot would relay it.
";

pub fn run() -> Result<()> {
    let app = Command::new("APT Lookup Tool")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Query package metadata from local APT mirrors")
        .long_about(ABOUT)
        .arg_required_else_help(true);

    let app = app.arg(
        Arg::new("aptdir")
            .long("aptdir")
            .takes_value(true)
            .default_value("aptdir")
            .global(true)
            .help("Directory holding per-distro .list files and cache state"),
    );

    let app = app.arg(
        Arg::new("architecture")
            .long("architecture")
            .takes_value(true)
            .default_value("i386")
            .global(true)
            .help("Architecture the binary indices were built for"),
    );

    let app = app.arg(
        Arg::new("timeout-secs")
            .long("timeout-secs")
            .takes_value(true)
            .default_value("30")
            .global(true)
            .help("Upper bound in seconds on a single index tool invocation"),
    );

    let app = app.subcommand(
        Command::new("find")
            .about("Search for packages by name, falling back to file contents")
            .arg(
                Arg::new("query")
                    .required(true)
                    .help("Package or file name, optionally followed by a distribution"),
            )
            .arg(
                Arg::new("distro")
                    .default_value("hardy")
                    .help("Distribution to search when the query does not name one"),
            ),
    );

    let app = app.subcommand(
        Command::new("info")
            .about("Show the best-versioned record of a package")
            .arg(
                Arg::new("query")
                    .required(true)
                    .help("Package name, optionally followed by a distribution"),
            )
            .arg(
                Arg::new("distro")
                    .default_value("hardy")
                    .help("Distribution to search when the query does not name one"),
            ),
    );

    let matches = app.get_matches();

    match matches.subcommand() {
        Some(("find", args)) => command_find(args),
        Some(("info", args)) => command_info(args),
        _ => Ok(()),
    }
}

fn lookup_from_args(args: &ArgMatches) -> Result<PackageLookup<apt_lookup::invoker::AptInvoker>> {
    let timeout = args.value_of_t::<u64>("timeout-secs")?;

    let mut config = LookupConfig::new(args.value_of("aptdir").expect("aptdir has a default"));
    config.architecture = args
        .value_of("architecture")
        .expect("architecture has a default")
        .to_string();
    config.command_timeout = Duration::from_secs(timeout);

    Ok(PackageLookup::new(config))
}

fn command_find(args: &ArgMatches) -> Result<()> {
    let lookup = lookup_from_args(args)?;

    let query = args.value_of("query").expect("query argument is required");
    let distro = args.value_of("distro").expect("distro has a default");

    println!("{}", lookup.find(query, distro, true));

    Ok(())
}

fn command_info(args: &ArgMatches) -> Result<()> {
    let lookup = lookup_from_args(args)?;

    let query = args.value_of("query").expect("query argument is required");
    let distro = args.value_of("distro").expect("distro has a default");

    println!("{}", lookup.info(query, distro));

    Ok(())
}
