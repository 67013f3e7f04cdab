//! File names of the VSE artifact store. These must match the names the
//! training pipeline writes, byte for byte.

pub const PREPROCESSOR_FILE: &str = "preprocessor_reinforcement_{race}.pkl";
pub const POLICY_TFLITE_FILE: &str = "nn_reinforcement_{race}.tflite";

pub const SUPERVISED_PREPROCESSOR_TIRECHANGE: &str = "preprocessor_supervised_tirechange.pkl";
pub const SUPERVISED_NN_TIRECHANGE: &str = "nn_supervised_tirechange.tflite";
pub const SUPERVISED_PREPROCESSOR_COMPOUNDCHOICE: &str = "preprocessor_supervised_compoundchoice.pkl";
pub const SUPERVISED_NN_COMPOUNDCHOICE: &str = "nn_supervised_compoundchoice.tflite";

/// Race identifier used in reinforcement file names, e.g. `Shanghai_2019`.
pub fn race_token(track_name: &str, season: u32) -> String {
    format!("{}_{}", track_name, season)
}

pub fn preprocessor_file(race: &str) -> String {
    PREPROCESSOR_FILE.replace("{race}", race)
}

pub fn policy_tflite_file(race: &str) -> String {
    POLICY_TFLITE_FILE.replace("{race}", race)
}
