use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// Parameter names understood by the NORA3 time-series extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variable {
    AirPressureAtSeaLevel,
    XWind10m,
    YWind10m,
    ToaNetDownwardShortwaveFlux,
    SurfaceNetDownwardShortwaveFlux,
    SurfaceDownwellingShortwaveFlux,
    SnowfallAmountAcc,
    PrecipitationAmountAcc,
    AirTemperature2m,
    RelativeHumidity2m,
    CloudAreaFraction,
    ConvectiveCloudAreaFraction,
    HighTypeCloudAreaFraction,
    MediumTypeCloudAreaFraction,
    LowTypeCloudAreaFraction,
    PrecipitableWater,
    // SURFEX fields, 3-hourly
    AsnVeg,
    TalbIsba,
    Lai,
    Veg,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown NORA3 parameter: {0}")]
pub struct VariableParseError(pub String);

impl Variable {
    /// The SUNPOINT batch, in extraction order.
    pub const SUNPOINT: [Variable; 16] = [
        Variable::AirPressureAtSeaLevel,
        Variable::XWind10m,
        Variable::YWind10m,
        Variable::ToaNetDownwardShortwaveFlux,
        Variable::SurfaceNetDownwardShortwaveFlux,
        Variable::SurfaceDownwellingShortwaveFlux,
        Variable::SnowfallAmountAcc,
        Variable::PrecipitationAmountAcc,
        Variable::AirTemperature2m,
        Variable::RelativeHumidity2m,
        Variable::CloudAreaFraction,
        Variable::ConvectiveCloudAreaFraction,
        Variable::HighTypeCloudAreaFraction,
        Variable::MediumTypeCloudAreaFraction,
        Variable::LowTypeCloudAreaFraction,
        Variable::PrecipitableWater,
    ];

    pub const ALL: [Variable; 20] = [
        Variable::AirPressureAtSeaLevel,
        Variable::XWind10m,
        Variable::YWind10m,
        Variable::ToaNetDownwardShortwaveFlux,
        Variable::SurfaceNetDownwardShortwaveFlux,
        Variable::SurfaceDownwellingShortwaveFlux,
        Variable::SnowfallAmountAcc,
        Variable::PrecipitationAmountAcc,
        Variable::AirTemperature2m,
        Variable::RelativeHumidity2m,
        Variable::CloudAreaFraction,
        Variable::ConvectiveCloudAreaFraction,
        Variable::HighTypeCloudAreaFraction,
        Variable::MediumTypeCloudAreaFraction,
        Variable::LowTypeCloudAreaFraction,
        Variable::PrecipitableWater,
        Variable::AsnVeg,
        Variable::TalbIsba,
        Variable::Lai,
        Variable::Veg,
    ];

    /// NetCDF name, as passed to the extractor's `-p` flag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Variable::AirPressureAtSeaLevel => "air_pressure_at_sea_level",
            Variable::XWind10m => "x_wind_10m",
            Variable::YWind10m => "y_wind_10m",
            Variable::ToaNetDownwardShortwaveFlux => {
                "integral_of_toa_net_downward_shortwave_flux_wrt_time"
            }
            Variable::SurfaceNetDownwardShortwaveFlux => {
                "integral_of_surface_net_downward_shortwave_flux_wrt_time"
            }
            Variable::SurfaceDownwellingShortwaveFlux => {
                "integral_of_surface_downwelling_shortwave_flux_in_air_wrt_time"
            }
            Variable::SnowfallAmountAcc => "snowfall_amount_acc",
            Variable::PrecipitationAmountAcc => "precipitation_amount_acc",
            Variable::AirTemperature2m => "air_temperature_2m",
            Variable::RelativeHumidity2m => "relative_humidity_2m",
            Variable::CloudAreaFraction => "cloud_area_fraction",
            Variable::ConvectiveCloudAreaFraction => "convective_cloud_area_fraction",
            Variable::HighTypeCloudAreaFraction => "high_type_cloud_area_fraction",
            Variable::MediumTypeCloudAreaFraction => "medium_type_cloud_area_fraction",
            Variable::LowTypeCloudAreaFraction => "low_type_cloud_area_fraction",
            Variable::PrecipitableWater => {
                "lwe_thickness_of_atmosphere_mass_content_of_water_vapor"
            }
            Variable::AsnVeg => "ASN_VEG",
            Variable::TalbIsba => "TALB_ISBA",
            Variable::Lai => "LAI",
            Variable::Veg => "VEG",
        }
    }

    /// Fields stored as time integrals or running accumulations.
    pub fn is_accumulated(&self) -> bool {
        matches!(
            self,
            Variable::ToaNetDownwardShortwaveFlux
                | Variable::SurfaceNetDownwardShortwaveFlux
                | Variable::SurfaceDownwellingShortwaveFlux
                | Variable::SnowfallAmountAcc
                | Variable::PrecipitationAmountAcc
        )
    }

    pub fn is_surfex(&self) -> bool {
        matches!(
            self,
            Variable::AsnVeg | Variable::TalbIsba | Variable::Lai | Variable::Veg
        )
    }

    /// Default output file name: `<variable>.nc`.
    pub fn file_name(&self) -> String {
        format!("{}.nc", self.as_str())
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variable {
    type Err = VariableParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variable::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| VariableParseError(s.to_string()))
    }
}

impl Serialize for Variable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Variable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}
