//! Presenting the restored fingerprint

use crate::error::{FingerprintError, Result};

/// Receives the final fingerprint for presentation
pub trait FingerprintDisplay {
    fn show(&self, value: f64) -> Result<()>;
}

impl<D: FingerprintDisplay + ?Sized> FingerprintDisplay for &D {
    fn show(&self, value: f64) -> Result<()> {
        (**self).show(value)
    }
}

/// Display that discards the value
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDisplay;

impl FingerprintDisplay for NoDisplay {
    fn show(&self, _value: f64) -> Result<()> {
        Ok(())
    }
}

/// Appends `<div style="font-size: 30px">{value}</div>` to `document.body`
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentDisplay;

impl FingerprintDisplay for DocumentDisplay {
    fn show(&self, value: f64) -> Result<()> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| FingerprintError::Display("no document".into()))?;
        let body = document
            .body()
            .ok_or_else(|| FingerprintError::Display("document has no body".into()))?;

        let div = document
            .create_element("div")
            .map_err(FingerprintError::display)?;
        div.set_attribute("style", "font-size: 30px")
            .map_err(FingerprintError::display)?;
        div.set_text_content(Some(&value.to_string()));
        body.append_child(&div).map_err(FingerprintError::display)?;
        Ok(())
    }
}
