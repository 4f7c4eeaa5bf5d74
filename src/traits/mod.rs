pub mod series_provider;
