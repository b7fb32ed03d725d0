use crate::attributes::{
    extract_attributes, is_marker, parse_qualifier, ComponentAttributes, DefaultDefinition,
    FieldAttributes, AUTOWIRED, COMPONENT, POST_CONSTRUCT, QUALIFIER,
};
use itertools::Itertools;
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote, ToTokens};
use syn::spanned::Spanned;
use syn::{
    Data, DataStruct, DeriveInput, Error, Field, Fields, FnArg, GenericArgument, Generics,
    ImplItem, ImplItemFn, ItemImpl, LitStr, Path, PathArguments, Result, ReturnType, Signature,
    Type, TypePath,
};

struct Parameter {
    ty: Type,
    qualifier: Option<LitStr>,
}

struct Constructor {
    name: String,
    is_autowired: bool,
    parameters: Vec<Parameter>,
    instance: TokenStream,
}

enum ConstructorKind {
    Infallible,
    Fallible,
}

fn reject_generics(generics: &Generics, message: &str) -> Result<()> {
    if generics.params.is_empty() && generics.where_clause.is_none() {
        Ok(())
    } else {
        Err(Error::new(generics.span(), message))
    }
}

fn take_argument(ty: &Type) -> TokenStream {
    quote! {
        arguments.take::<<#ty as std::ops::Deref>::Target>()?
    }
}

fn generate_parameter_definition(parameter: &Parameter) -> TokenStream {
    let ty = &parameter.ty;
    let definition = quote! {
        autowire_di::component::ParameterDefinition::of::<<#ty as std::ops::Deref>::Target>()
    };

    match &parameter.qualifier {
        Some(qualifier) => quote!(#definition.qualified(#qualifier)),
        None => definition,
    }
}

fn generate_field_construction(field: &Field, parameters: &mut Vec<Parameter>) -> Result<TokenStream> {
    let attributes = extract_attributes::<FieldAttributes>(&field.attrs, COMPONENT)?
        .into_iter()
        .at_most_one()
        .map_err(|_| Error::new(field.span(), "Duplicate component field attribute!"))?
        .unwrap_or_default();

    Ok(match attributes.default {
        Some(DefaultDefinition::Expr(path)) => quote!(#path()),
        Some(DefaultDefinition::Default) => quote!(std::default::Default::default()),
        None => {
            parameters.push(Parameter {
                ty: field.ty.clone(),
                qualifier: attributes.qualifier,
            });
            take_argument(&field.ty)
        }
    })
}

fn generate_field_constructor(ident: &Ident, fields: &Fields) -> Result<Constructor> {
    let mut parameters = vec![];
    let instance = match fields {
        Fields::Named(fields) => {
            let fields: Vec<_> = fields
                .named
                .iter()
                .map(|field| -> Result<TokenStream> {
                    let field_ident = &field.ident;
                    let construction = generate_field_construction(field, &mut parameters)?;
                    Ok(quote! {
                        #field_ident: #construction
                    })
                })
                .try_collect()?;

            quote! {
                #ident {
                    #(#fields),*
                }
            }
        }
        Fields::Unnamed(fields) => {
            let fields: Vec<_> = fields
                .unnamed
                .iter()
                .map(|field| generate_field_construction(field, &mut parameters))
                .try_collect()?;

            quote! {
                #ident(#(#fields),*)
            }
        }
        Fields::Unit => quote!(#ident),
    };

    Ok(Constructor {
        name: "new".to_string(),
        is_autowired: false,
        parameters,
        instance,
    })
}

fn generate_component_type(
    self_ty: &TokenStream,
    name: &str,
    constructors: &[Constructor],
    post_construct: &[Ident],
) -> TokenStream {
    let constructor_idents = (0..constructors.len()).map(|index| format_ident!("construct_{}", index));
    let constructor_functions = constructors
        .iter()
        .zip(constructor_idents.clone())
        .map(|(constructor, constructor_ident)| {
            let instance = &constructor.instance;
            quote! {
                #[allow(unused_mut)]
                fn #constructor_ident(
                    mut arguments: autowire_di::component::ConstructorArguments,
                ) -> Result<autowire_di::instance_provider::ComponentInstanceAnyPtr, autowire_di::instance_provider::ErrorPtr> {
                    let instance = #instance;
                    arguments.finish()?;
                    Ok(autowire_di::instance_provider::ComponentInstancePtr::new(instance) as autowire_di::instance_provider::ComponentInstanceAnyPtr)
                }
            }
        });
    let constructor_definitions = constructors
        .iter()
        .zip(constructor_idents)
        .map(|(constructor, constructor_ident)| {
            let constructor_name = &constructor.name;
            let autowired = if constructor.is_autowired {
                quote!(.autowired())
            } else {
                quote!()
            };
            let parameters = constructor
                .parameters
                .iter()
                .map(generate_parameter_definition);

            quote! {
                autowire_di::component::ConstructorDefinition::new(#constructor_name, #constructor_ident)
                    #autowired
                    #(.with_parameter(#parameters))*
            }
        });

    let hook_idents = (0..post_construct.len()).map(|index| format_ident!("post_construct_{}", index));
    let hook_functions = post_construct
        .iter()
        .zip(hook_idents.clone())
        .map(|(method, hook_ident)| {
            quote! {
                fn #hook_ident(
                    instance: &autowire_di::instance_provider::ComponentInstanceAnyPtr,
                ) -> Result<(), autowire_di::instance_provider::ErrorPtr> {
                    use autowire_di::component::PostConstructResult;
                    autowire_di::component::instance_ref::<#self_ty>(instance)?
                        .#method()
                        .into_hook_result()
                }
            }
        });
    let hook_names = post_construct.iter().map(|method| method.to_string());

    quote! {
        #[automatically_derived]
        impl autowire_di::component::Injectable for #self_ty {
            fn registrable() -> Option<autowire_di::component::ComponentType> {
                Some(<Self as autowire_di::component::Component>::component_type())
            }
        }

        #[automatically_derived]
        impl autowire_di::component::Component for #self_ty {
            fn component_type() -> autowire_di::component::ComponentType {
                #(#constructor_functions)*
                #(#hook_functions)*

                autowire_di::component::ComponentType::component::<#self_ty>()
                    .with_location(#name, module_path!())
                    #(.with_constructor(#constructor_definitions))*
                    #(.with_post_construct(autowire_di::component::PostConstructDefinition::new(#hook_names, #hook_idents)))*
            }
        }

        const _: () = {
            fn register() -> autowire_di::component::ComponentType {
                <#self_ty as autowire_di::component::Component>::component_type()
            }

            autowire_di::component_registry::internal::submit! {
                autowire_di::component_registry::internal::ComponentRegisterer {
                    module_path: module_path!(),
                    name: #name,
                    register,
                }
            };
        };
    }
}

pub fn expand_component(input: &DeriveInput) -> Result<TokenStream> {
    let Data::Struct(DataStruct { fields, .. }) = &input.data else {
        return Err(Error::new(
            input.span(),
            "Can only derive Component on structs!",
        ));
    };

    reject_generics(&input.generics, "Generic components are not supported!")?;

    let ident = &input.ident;
    let attributes = extract_attributes::<ComponentAttributes>(&input.attrs, COMPONENT)?
        .into_iter()
        .at_most_one()
        .map_err(|_| Error::new(input.span(), "Duplicate component attribute!"))?
        .unwrap_or_default();

    let post_construct: Vec<Ident> = attributes
        .post_construct
        .iter()
        .map(|name| name.parse())
        .try_collect()?;

    let constructor = generate_field_constructor(ident, fields)?;

    Ok(generate_component_type(
        &ident.to_token_stream(),
        &ident.to_string(),
        &[constructor],
        &post_construct,
    ))
}

pub fn expand_discoverable(input: &DeriveInput) -> Result<TokenStream> {
    reject_generics(&input.generics, "Generic types cannot be discovered!")?;

    let ident = &input.ident;
    let name = ident.to_string();

    Ok(quote! {
        const _: () = {
            fn register() -> autowire_di::component::ComponentType {
                autowire_di::component::ComponentType::unmarked::<#ident>()
                    .with_location(#name, module_path!())
            }

            autowire_di::component_registry::internal::submit! {
                autowire_di::component_registry::internal::ComponentRegisterer {
                    module_path: module_path!(),
                    name: #name,
                    register,
                }
            };
        };
    })
}

fn is_self_type(path: &Path, ident: &Ident) -> bool {
    path.get_ident()
        .map_or(false, |path_ident| path_ident == "Self" || path_ident == ident)
}

fn constructor_kind(output: &ReturnType, ident: &Ident) -> Option<ConstructorKind> {
    let ReturnType::Type(_, ty) = output else {
        return None;
    };
    let Type::Path(TypePath { qself: None, path }) = ty.as_ref() else {
        return None;
    };

    if is_self_type(path, ident) {
        return Some(ConstructorKind::Infallible);
    }

    let last = path.segments.last()?;
    if last.ident != "Result" {
        return None;
    }

    let PathArguments::AngleBracketed(arguments) = &last.arguments else {
        return None;
    };

    match arguments.args.first() {
        Some(GenericArgument::Type(Type::Path(TypePath { qself: None, path })))
            if is_self_type(path, ident) =>
        {
            Some(ConstructorKind::Fallible)
        }
        _ => None,
    }
}

fn verify_plain_signature(signature: &Signature, message: &str) -> Result<()> {
    reject_generics(&signature.generics, message)?;
    if let Some(asyncness) = &signature.asyncness {
        return Err(Error::new(asyncness.span(), message));
    }

    Ok(())
}

/// Removes qualifier attributes from parameters and returns the parameter definitions.
fn extract_parameters(method: &mut ImplItemFn) -> Result<Vec<Parameter>> {
    let mut parameters = vec![];
    for input in &mut method.sig.inputs {
        let FnArg::Typed(input) = input else {
            continue;
        };

        let (qualifiers, attrs): (Vec<_>, Vec<_>) = std::mem::take(&mut input.attrs)
            .into_iter()
            .partition(|attribute| attribute.path().is_ident(QUALIFIER));
        input.attrs = attrs;

        let qualifier = qualifiers
            .iter()
            .map(parse_qualifier)
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .at_most_one()
            .map_err(|_| Error::new(input.span(), "Duplicate qualifier!"))?;

        parameters.push(Parameter {
            ty: input.ty.as_ref().clone(),
            qualifier,
        });
    }

    Ok(parameters)
}

fn is_post_construct_signature(signature: &Signature) -> bool {
    signature
        .receiver()
        .map_or(false, |receiver| receiver.reference.is_some() && receiver.mutability.is_none())
        && signature.inputs.len() == 1
}

pub fn expand_component_impl(mut item: ItemImpl) -> Result<TokenStream> {
    if let Some((_, path, _)) = &item.trait_ {
        return Err(Error::new(
            path.span(),
            "#[component] can only be placed on inherent impl blocks!",
        ));
    }

    reject_generics(&item.generics, "Generic components are not supported!")?;

    let ident = match item.self_ty.as_ref() {
        Type::Path(TypePath { qself: None, path }) => path
            .segments
            .last()
            .filter(|segment| segment.arguments.is_empty())
            .map(|segment| segment.ident.clone()),
        _ => None,
    }
    .ok_or_else(|| Error::new(item.self_ty.span(), "Unsupported component type!"))?;

    let mut constructors = vec![];
    let mut post_construct = vec![];
    let mut autowired_span = None;

    for impl_item in &mut item.items {
        let ImplItem::Fn(method) = impl_item else {
            continue;
        };

        let mut is_autowired = false;
        let mut is_post_construct = false;
        let mut attrs = vec![];
        for attribute in std::mem::take(&mut method.attrs) {
            if is_marker(&attribute, AUTOWIRED)? {
                if autowired_span.is_some() {
                    return Err(Error::new(
                        attribute.span(),
                        "Only one constructor can be #[autowired]!",
                    ));
                }

                autowired_span = Some(attribute.span());
                is_autowired = true;
            } else if is_marker(&attribute, POST_CONSTRUCT)? {
                is_post_construct = true;
            } else {
                attrs.push(attribute);
            }
        }
        method.attrs = attrs;

        let parameters = extract_parameters(method)?;
        let has_qualifiers = parameters
            .iter()
            .any(|parameter| parameter.qualifier.is_some());

        if is_post_construct {
            if !is_post_construct_signature(&method.sig) {
                return Err(Error::new(
                    method.sig.span(),
                    "Post-construction hooks should only take &self!",
                ));
            }

            verify_plain_signature(&method.sig, "Post-construction hooks cannot be generic or async!")?;
            post_construct.push(method.sig.ident.clone());
            continue;
        }

        let kind = if method.sig.receiver().is_none() {
            constructor_kind(&method.sig.output, &ident)
        } else {
            None
        };

        let Some(kind) = kind else {
            if is_autowired {
                return Err(Error::new(
                    method.sig.span(),
                    "#[autowired] can only be placed on constructors returning Self!",
                ));
            }
            if has_qualifiers {
                return Err(Error::new(
                    method.sig.span(),
                    "Qualifiers can only be placed on constructor parameters!",
                ));
            }
            continue;
        };

        verify_plain_signature(&method.sig, "Constructors cannot be generic or async!")?;

        let method_ident = &method.sig.ident;
        let arguments = parameters.iter().map(|parameter| take_argument(&parameter.ty));
        let self_ty = &item.self_ty;
        let instance = match kind {
            ConstructorKind::Infallible => quote! {
                <#self_ty>::#method_ident(#(#arguments),*)
            },
            ConstructorKind::Fallible => quote! {
                <#self_ty>::#method_ident(#(#arguments),*)
                    .map_err(autowire_di::component::into_error_ptr)?
            },
        };

        constructors.push(Constructor {
            name: method_ident.to_string(),
            is_autowired,
            parameters,
            instance,
        });
    }

    if constructors.is_empty() {
        return Err(Error::new(
            item.self_ty.span(),
            "Components need at least one constructor returning Self or Result<Self, E>!",
        ));
    }

    let component = generate_component_type(
        &item.self_ty.to_token_stream(),
        &ident.to_string(),
        &constructors,
        &post_construct,
    );

    Ok(quote! {
        #item
        #component
    })
}
