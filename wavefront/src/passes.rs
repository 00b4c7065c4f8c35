use log::debug;

use crate::{Device, IntegratorBuffers, IntegratorConfig, Result};

macro_rules! passes {
    ([ $( $name:ident => $class:ident, )* ]) => {
        $( mod $name; )*
        $( pub use self::$name::*; )*

        #[derive(Debug)]
        pub struct IntegratorPasses<D>
        where
            D: Device,
        {
            $( pub $name: $class<D>, )*
        }

        impl<D> IntegratorPasses<D>
        where
            D: Device,
        {
            pub fn new(
                device: &D,
                config: &IntegratorConfig,
                buffers: &IntegratorBuffers<D>,
            ) -> Result<Self> {
                debug!("Initializing integrator passes");

                Ok(Self {
                    $( $name: $class::new(device, config, buffers)?, )*
                })
            }
        }
    };
}

passes!([
    clear_counter => ClearCounterPass,
    increment_counter => IncrementCounterPass,
    raygen => RaygenPass,
    reset_radiance => ResetRadiancePass,
    resolve => ResolvePass,
    shade_hit => ShadeHitPass,
    shade_miss => ShadeMissPass,
]);
