/// Generates the optional component slot API for [`NodeClass`] and [`Node`].
///
/// Each entry `field: ClassType => InstanceType` expects a field of the same
/// name on both structs: `Option<Arc<ClassType>>` on the class and
/// `Option<InstanceType>` on the instance. The class side gets
/// `has_/field/shared_/field_mut/set_/create_/remove_` accessors, the
/// instance side `has_/field/field_mut`, and both sides get the plumbing
/// that visits every slot (serialization, hashing, instantiation).
///
/// [`NodeClass`]: crate::node::NodeClass
/// [`Node`]: crate::node::Node
macro_rules! node_components {
    ( $( $field:ident : $class:ty => $instance:ty ),* $(,)? ) => {
        paste::paste! {
            impl NodeClass {
                $(
                    #[inline]
                    #[must_use]
                    pub fn [<has_ $field>](&self) -> bool {
                        self.$field.is_some()
                    }

                    #[inline]
                    #[must_use]
                    pub fn $field(&self) -> Option<&$class> {
                        self.$field.as_deref()
                    }

                    #[inline]
                    #[must_use]
                    pub fn [<shared_ $field>](&self) -> Option<&Arc<$class>> {
                        self.$field.as_ref()
                    }

                    /// Copy-on-write access; other holders of the shared
                    /// class keep the previous value.
                    pub fn [<$field _mut>](&mut self) -> Option<&mut $class> {
                        self.$field.as_mut().map(Arc::make_mut)
                    }

                    pub fn [<set_ $field>](&mut self, class: $class) {
                        self.$field = Some(Arc::new(class));
                    }

                    /// Replace the slot with a default component and return it.
                    pub fn [<create_ $field>](&mut self) -> &mut $class {
                        let slot = self.$field.insert(Arc::new(<$class>::default()));
                        Arc::make_mut(slot)
                    }

                    pub fn [<remove_ $field>](&mut self) {
                        self.$field = None;
                    }
                )*

                fn components_into_json(&self, chunk: &mut serde_json::Map<String, serde_json::Value>) {
                    $(
                        if let Some(component) = &self.$field {
                            chunk.insert(
                                stringify!($field).to_owned(),
                                strata_core::json::to_json(component.as_ref()),
                            );
                        }
                    )*
                }

                fn components_from_json(&mut self, value: &serde_json::Value) -> strata_core::Result<()> {
                    $(
                        if let Some(chunk) = value.get(stringify!($field)) {
                            self.$field = Some(Arc::new(<$class as serde::Deserialize>::deserialize(chunk)?));
                        }
                    )*
                    Ok(())
                }

                fn hash_components(&self, mut hash: u64) -> u64 {
                    $(
                        hash = strata_core::hash_combine(
                            hash,
                            &self.$field.as_ref().map(|c| c.hash_value()),
                        );
                    )*
                    hash
                }
            }

            impl Node {
                $(
                    #[inline]
                    #[must_use]
                    pub fn [<has_ $field>](&self) -> bool {
                        self.$field.is_some()
                    }

                    #[inline]
                    #[must_use]
                    pub fn $field(&self) -> Option<&$instance> {
                        self.$field.as_ref()
                    }

                    #[inline]
                    pub fn [<$field _mut>](&mut self) -> Option<&mut $instance> {
                        self.$field.as_mut()
                    }
                )*

                fn reset_components(&mut self) {
                    $(
                        self.$field = self.class.$field.clone().map(<$instance>::new);
                    )*
                }
            }
        }
    };
}
