// Command-line options

use std::path::PathBuf;

use crate::error::{SimError, SimResult};
use crate::mitigation::MitigationMethod;
use crate::physics_engine::Material;

pub const USAGE: &str = "\
usage: meteor-impact [options]

  --diameter <m>          impactor diameter in meters (default 100)
  --velocity <km/s>       entry velocity (default 20)
  --material <name>       iron|stone|ice|gold|comet|carbon|concrete|wood|water
  --angle <deg>           entry angle from horizontal (default 45)
  --population <p/km²>    population density (default from config)
  --ocean                 impact into the ocean
  --asteroid <name>       take diameter and velocity from a known asteroid
  --offline               never query the live database
  --mitigate <method>     kinetic|gravity|laser|shelters
  --survey <file.json>    infrastructure survey of the affected area
  --monte-carlo <runs>    add an uncertainty ensemble
  --seed <n>              ensemble seed (default 42)
  -h, --help              this message";

#[derive(Debug, Clone, PartialEq)]
pub struct CliOptions {
    pub diameter_m: Option<f64>,
    pub velocity_km_s: Option<f64>,
    pub material: Material,
    pub angle_deg: f64,
    pub population_density: Option<f64>,
    pub ocean: bool,
    pub asteroid: Option<String>,
    pub offline: bool,
    pub mitigate: Option<MitigationMethod>,
    pub survey: Option<PathBuf>,
    pub monte_carlo_runs: Option<u32>,
    pub seed: u64,
    pub help: bool,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            diameter_m: None,
            velocity_km_s: None,
            material: Material::Stone,
            angle_deg: 45.0,
            population_density: None,
            ocean: false,
            asteroid: None,
            offline: false,
            mitigate: None,
            survey: None,
            monte_carlo_runs: None,
            seed: 42,
            help: false,
        }
    }
}

fn parse_number<T: std::str::FromStr>(field: &'static str, raw: &str) -> SimResult<T> {
    raw.parse()
        .map_err(|_| SimError::invalid(field, format!("{:?} is not a number", raw)))
}

impl CliOptions {
    pub fn parse<I, S>(args: I) -> SimResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut opts = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            let arg = arg.as_ref();
            let mut value = |flag: &'static str| -> SimResult<String> {
                args.next()
                    .map(|v| v.as_ref().to_string())
                    .ok_or_else(|| SimError::invalid(flag, "missing value"))
            };

            match arg {
                "--diameter" => {
                    opts.diameter_m = Some(parse_number("diameter", &value("diameter")?)?)
                }
                "--velocity" => {
                    opts.velocity_km_s = Some(parse_number("velocity", &value("velocity")?)?)
                }
                "--material" => opts.material = value("material")?.parse()?,
                "--angle" => opts.angle_deg = parse_number("angle", &value("angle")?)?,
                "--population" => {
                    let density = parse_number("population", &value("population")?)?;
                    opts.population_density = Some(density)
                }
                "--ocean" => opts.ocean = true,
                "--asteroid" => opts.asteroid = Some(value("asteroid")?),
                "--offline" => opts.offline = true,
                "--mitigate" => opts.mitigate = Some(value("mitigate")?.parse()?),
                "--survey" => opts.survey = Some(PathBuf::from(value("survey")?)),
                "--monte-carlo" => {
                    let runs = parse_number("monte-carlo", &value("monte-carlo")?)?;
                    opts.monte_carlo_runs = Some(runs)
                }
                "--seed" => opts.seed = parse_number("seed", &value("seed")?)?,
                "-h" | "--help" => opts.help = true,
                other => {
                    return Err(SimError::invalid(
                        "argument",
                        format!("unrecognized option {:?}", other),
                    ))
                }
            }
        }

        Ok(opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = CliOptions::parse(Vec::<String>::new()).unwrap();
        assert_eq!(opts, CliOptions::default());
    }

    #[test]
    fn test_full_command_line() {
        let opts = CliOptions::parse([
            "--diameter", "50", "--velocity", "17", "--material", "iron", "--angle", "20",
            "--ocean", "--mitigate", "kinetic", "--monte-carlo", "100",
        ])
        .unwrap();
        assert_eq!(opts.diameter_m, Some(50.0));
        assert_eq!(opts.material, Material::Iron);
        assert!(opts.ocean);
        assert_eq!(opts.mitigate, Some(MitigationMethod::Kinetic));
        assert_eq!(opts.monte_carlo_runs, Some(100));
    }

    #[test]
    fn test_errors() {
        assert!(CliOptions::parse(["--diameter"]).is_err());
        assert!(CliOptions::parse(["--diameter", "big"]).is_err());
        assert!(CliOptions::parse(["--material", "cheese"]).is_err());
        assert!(CliOptions::parse(["--bogus"]).is_err());
    }
}
