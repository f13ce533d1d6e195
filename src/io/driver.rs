use std::sync::Once;

static REGISTER: Once = Once::new();

/// Register all GDAL drivers once per process
///
/// Every entry point that opens or creates a raster calls this first. There is
/// no matching teardown; the registry lives until the process exits.
pub fn ensure_registered() {
    REGISTER.call_once(|| {
        unsafe {
            gdal_sys::GDALAllRegister();
        }
        log::debug!("GDAL drivers registered");
    });
}
