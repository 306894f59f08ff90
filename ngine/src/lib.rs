#[cfg(feature = "ngine-base")]
pub use ngine_base as base;

#[cfg(feature = "ngine-asset")]
pub use ngine_asset as asset;

#[cfg(all(test, feature = "asset"))]
mod test {
    use crate::asset::{
        Asset, AssetLocation, AssetPackageBuilder, AssetReader, AssetRegistry, AssetResult,
        AssetWriter, MemoryPackageStore, NamedAsset,
    };
    use crate::base::Name;
    use std::io::{Read, Write};

    #[derive(Default)]
    struct ShaderSource {
        location: AssetLocation,
        source: String,
    }

    impl Asset for ShaderSource {
        fn on_load(
            &mut self,
            reader: &mut AssetReader<'_>,
        ) -> AssetResult<()> {
            reader.read_to_string(&mut self.source)?;
            Ok(())
        }

        fn on_save(
            &self,
            writer: &mut AssetWriter<'_>,
        ) -> AssetResult<()> {
            writer.write_all(self.source.as_bytes())?;
            Ok(())
        }

        fn location(&self) -> &AssetLocation {
            &self.location
        }

        fn location_mut(&mut self) -> &mut AssetLocation {
            &mut self.location
        }
    }

    impl NamedAsset for ShaderSource {
        const TYPE_NAME: &'static str = "ng.shader_source";
    }

    #[test]
    fn load_through_facade() {
        let shader = ShaderSource {
            source: "void main() {}".to_string(),
            ..Default::default()
        };
        let mut builder = AssetPackageBuilder::new();
        builder
            .add_asset("blit", ShaderSource::TYPE_NAME, &shader, None)
            .unwrap();

        let mut store = MemoryPackageStore::new();
        store.insert_package("shaders", &builder.build()).unwrap();

        let mut registry = AssetRegistry::new(Box::new(store));
        registry.register::<ShaderSource>().unwrap();
        assert!(registry
            .factory()
            .contains(&Name::new(ShaderSource::TYPE_NAME)));

        let loaded = registry
            .load_checked::<ShaderSource>("shaders.blit")
            .unwrap();
        assert_eq!(loaded.source, "void main() {}");
        assert_eq!(registry.asset_path(&*loaded), "shaders.blit");
    }
}
