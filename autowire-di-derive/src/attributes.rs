use syn::{Attribute, Error, Expr, ExprArray, ExprLit, ExprPath, Lit, LitStr, Result, Token};

pub const COMPONENT: &str = "component";
pub const AUTOWIRED: &str = "autowired";
pub const POST_CONSTRUCT: &str = "post_construct";
pub const QUALIFIER: &str = "qualifier";

pub enum DefaultDefinition {
    Default,
    Expr(ExprPath),
}

#[derive(Default)]
pub struct FieldAttributes {
    pub default: Option<DefaultDefinition>,
    pub qualifier: Option<LitStr>,
}

impl TryFrom<&Attribute> for FieldAttributes {
    type Error = Error;

    fn try_from(value: &Attribute) -> Result<Self> {
        let mut default = None;
        let mut qualifier = None;
        value.parse_nested_meta(|meta| {
            if meta.path.is_ident("default") {
                if meta.input.peek(Token![=]) {
                    let value = meta.value()?;
                    let expr: LitStr = value.parse()?;
                    default = Some(DefaultDefinition::Expr(expr.parse()?));
                } else {
                    default = Some(DefaultDefinition::Default);
                }
            } else if meta.path.is_ident(QUALIFIER) {
                qualifier = Some(meta.value().and_then(|value| value.parse())?);
            } else {
                return Err(meta.error("Unsupported component field attribute!"));
            }

            Ok(())
        })?;

        if default.is_some() && qualifier.is_some() {
            return Err(Error::new_spanned(
                value,
                "Default fields cannot be qualified!",
            ));
        }

        Ok(Self { default, qualifier })
    }
}

#[derive(Default)]
pub struct ComponentAttributes {
    pub post_construct: Vec<LitStr>,
}

impl TryFrom<&Attribute> for ComponentAttributes {
    type Error = Error;

    fn try_from(value: &Attribute) -> Result<Self> {
        let mut post_construct = vec![];
        value.parse_nested_meta(|meta| {
            if meta.path.is_ident(POST_CONSTRUCT) {
                let names: ExprArray = meta.value()?.parse()?;
                for elem in names.elems {
                    if let Expr::Lit(ExprLit {
                        lit: Lit::Str(string),
                        ..
                    }) = elem
                    {
                        post_construct.push(string);
                    } else {
                        return Err(Error::new_spanned(elem, "Expected method name string!"));
                    }
                }
            } else {
                return Err(meta.error("Unsupported component attribute!"));
            }

            Ok(())
        })?;

        Ok(Self { post_construct })
    }
}

/// Parses all attributes with the given name.
pub fn extract_attributes<'a, T>(attributes: &'a [Attribute], name: &str) -> Result<Vec<T>>
where
    T: TryFrom<&'a Attribute, Error = Error>,
{
    attributes
        .iter()
        .filter(|attribute| attribute.path().is_ident(name))
        .map(T::try_from)
        .collect()
}

/// Parses `#[qualifier("Name")]`.
pub fn parse_qualifier(attribute: &Attribute) -> Result<LitStr> {
    attribute.parse_args()
}

/// Checks for a marker attribute without arguments, e.g. `#[autowired]`.
pub fn is_marker(attribute: &Attribute, name: &str) -> Result<bool> {
    if attribute.path().is_ident(name) {
        attribute.meta.require_path_only()?;
        Ok(true)
    } else {
        Ok(false)
    }
}
