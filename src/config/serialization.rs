//! Config serialization to TOML
//!
//! Single source of truth for config file format.

use super::Config;

/// Quote and escape a value as a TOML basic string
fn toml_string(value: &str) -> String {
    toml::Value::String(value.to_string()).to_string()
}

impl Config {
    /// Render the config as a commented TOML template.
    ///
    /// The credential is never written; it is read from the environment only.
    pub fn to_toml(&self) -> String {
        let mut output = String::from("# usage-relay configuration\n");
        output.push_str("# Environment variables take precedence over values in this file.\n\n");
        output.push_str(&format!("bind_addr = \"{}\"\n", self.bind_addr));

        output.push_str(&self.upstream_to_toml());
        output.push_str(&self.events_to_toml());
        output.push_str(&self.logging_to_toml());
        output
    }

    fn upstream_to_toml(&self) -> String {
        let upstream = &self.upstream;
        let mut output = String::from("\n[upstream]\n");
        output.push_str("# The credential comes from OPENROUTER_API_KEY\n");
        output.push_str(&format!("api_url = {}\n", toml_string(&upstream.api_url)));
        match &upstream.http_referer {
            Some(referer) => {
                output.push_str(&format!("http_referer = {}\n", toml_string(referer)))
            }
            None => output.push_str("# http_referer = \"https://chat.example.com\"\n"),
        }
        match &upstream.x_title {
            Some(title) => output.push_str(&format!("x_title = {}\n", toml_string(title))),
            None => output.push_str("# x_title = \"My Chat\"\n"),
        }
        output
    }

    fn events_to_toml(&self) -> String {
        let events = &self.events;
        let mut output = String::from("\n[events]\n");
        output.push_str("# \"metadata\" or \"off\"\n");
        output.push_str(&format!("mode = \"{}\"\n", events.mode.as_str()));
        match &events.path {
            Some(path) => output.push_str(&format!(
                "path = {}\n",
                toml_string(&path.display().to_string())
            )),
            None => output.push_str("# path = \"./logs/events.jsonl\"  # default: stdout\n"),
        }
        output.push_str(&format!("channel_buffer = {}\n", events.channel_buffer));
        output
    }

    fn logging_to_toml(&self) -> String {
        let logging = &self.logging;
        let mut output = String::from("\n[logging]\n");
        output.push_str(&format!("level = {}\n", toml_string(&logging.level)));
        output.push_str(&format!("file_enabled = {}\n", logging.file_enabled));
        output.push_str(&format!(
            "file_dir = {}\n",
            toml_string(&logging.file_dir.display().to_string())
        ));
        output.push_str(&format!(
            "file_rotation = \"{}\"\n",
            logging.file_rotation.as_str()
        ));
        output.push_str(&format!("file_prefix = {}\n", toml_string(&logging.file_prefix)));
        output
    }
}
